//! The GPIO driver: lifecycle, locking, and the background event scanner.
//!
//! All register access, the pull handshake included, happens while holding a
//! single mutex that also guards the event state. The scan thread takes the
//! same mutex for one sweep at a time and calls the pin-changed handler after
//! releasing it, so a handler may call back into the driver.

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::events::{self, EventState};
use crate::gpio::{GpioPin, NumberingScheme, PinEvent, PinMode, PinValue};
use crate::level;
use crate::mapped::MappedRegisters;
use crate::mode;
use crate::numbering::PinNumbering;
use crate::registers::RegisterBank;
use crate::simulated::SimulatedRegisters;
use crate::timing::{BusyWait, Clock, NoSettle, Settle, SystemClock};
use log::{debug, warn};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Callback invoked from the scan thread with each pin whose event was accepted.
pub type PinChangedHandler = Arc<dyn Fn(GpioPin) + Send + Sync>;

/// Capability set shared by every GPIO driver variant.
pub trait GpioDriver {
    /// Sets the pin function. Input modes also program the pull resistor.
    fn gpio_set_mode(&self, pin: GpioPin, mode: PinMode) -> Result<()>;
    /// Reads the pin function back; pull direction is not recoverable.
    fn gpio_get_mode(&self, pin: GpioPin) -> Result<PinMode>;
    fn gpio_write(&self, pin: GpioPin, value: PinValue) -> Result<()>;
    fn gpio_read(&self, pin: GpioPin) -> Result<PinValue>;
    /// Programs the six detect enables of `pin` and arms or disarms it for scanning.
    fn gpio_set_events(&self, pin: GpioPin, events: PinEvent) -> Result<()>;
    fn gpio_get_events(&self, pin: GpioPin) -> Result<PinEvent>;
    /// Checks and clears the pin's latched event, applying debounce.
    fn gpio_was_event_detected(&self, pin: GpioPin) -> Result<bool>;
    fn convert_pin_number(&self, pin: u8, from: NumberingScheme, to: NumberingScheme)
        -> Result<u8>;
    fn get_debounce(&self) -> Duration;
    fn set_debounce(&self, debounce: Duration);
}

struct DriverState<B> {
    bank: B,
    events: EventState,
    closed: bool,
}

struct Shared<B> {
    state: Mutex<DriverState<B>>,
    stop: AtomicBool,
    handler: Mutex<Option<PinChangedHandler>>,
    settle: Arc<dyn Settle>,
    clock: Arc<dyn Clock>,
}

impl<B: RegisterBank> Shared<B> {
    fn lock_state(&self) -> MutexGuard<'_, DriverState<B>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, pins: &[GpioPin]) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(handler) = handler else {
            return;
        };
        for &pin in pins {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(pin))).is_err() {
                warn!("Pin changed handler panicked for {}", pin);
            }
        }
    }
}

fn scan_loop<B: RegisterBank>(shared: Arc<Shared<B>>) {
    debug!("Event scan thread started");
    loop {
        let accepted = {
            let mut guard = shared.lock_state();
            if shared.stop.load(Ordering::Acquire)
                || guard.closed
                || guard.events.armed_count() == 0
            {
                guard.events.scanning = false;
                break;
            }
            let now = shared.clock.now();
            let DriverState { bank, events, .. } = &mut *guard;
            events::scan_pass(bank, shared.settle.as_ref(), events, now)
        };
        if !accepted.is_empty() {
            shared.notify(&accepted);
        }
        thread::yield_now();
    }
    debug!("Event scan thread stopped");
}

/// Driver for the BCM283x GPIO register bank.
///
/// The bank is mapped on first use (or by [`Bcm2835Gpio::initialize`]) and
/// unmapped by [`Bcm2835Gpio::close`] or on drop. Every operation after
/// `close` fails with [`Error::Closed`]. The handle is `Send + Sync`; share it
/// between threads with an `Arc`.
pub struct Bcm2835Gpio<B: RegisterBank> {
    shared: Arc<Shared<B>>,
    scanner: Mutex<Option<JoinHandle<()>>>,
    numbering: PinNumbering,
}

/// Driver over the real memory-mapped registers.
pub type MappedGpio = Bcm2835Gpio<MappedRegisters>;
/// Driver over an in-memory register file.
pub type SimulatedGpio = Bcm2835Gpio<SimulatedRegisters>;

impl Bcm2835Gpio<MappedRegisters> {
    /// Creates a driver for the device in `config`. Nothing is mapped yet.
    pub fn new(config: DriverConfig) -> Self {
        let bank = MappedRegisters::new(config.device_path.clone(), config.base_offset);
        Self::from_parts(
            bank,
            Arc::new(BusyWait::new(config.settle_cycles)),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Creates a driver and maps the registers immediately.
    pub fn open(config: DriverConfig) -> Result<Self> {
        let driver = Self::new(config);
        driver.initialize()?;
        Ok(driver)
    }
}

impl Bcm2835Gpio<SimulatedRegisters> {
    /// Creates a driver over `registers` with no settle delay and the system clock.
    pub fn simulated(registers: SimulatedRegisters, config: DriverConfig) -> Self {
        Self::from_parts(registers, Arc::new(NoSettle), Arc::new(SystemClock), config)
    }
}

impl<B: RegisterBank> Bcm2835Gpio<B> {
    /// Assembles a driver from a register bank and timing sources.
    pub fn from_parts(
        bank: B,
        settle: Arc<dyn Settle>,
        clock: Arc<dyn Clock>,
        config: DriverConfig,
    ) -> Self {
        Bcm2835Gpio {
            shared: Arc::new(Shared {
                state: Mutex::new(DriverState {
                    bank,
                    events: EventState::new(config.debounce),
                    closed: false,
                }),
                stop: AtomicBool::new(false),
                handler: Mutex::new(None),
                settle,
                clock,
            }),
            scanner: Mutex::new(None),
            numbering: PinNumbering::new(config.board_map),
        }
    }

    /// Maps the register bank now instead of on first use.
    pub fn initialize(&self) -> Result<()> {
        self.with_bank(|_| Ok(()))
    }

    /// Stops the scan thread, waits for it, then unmaps the registers.
    /// Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.shared.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            self.shared.stop.store(true, Ordering::Release);
        }
        self.join_scanner();
        self.shared.lock_state().bank.unmap();
        debug!("GPIO driver closed");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock_state().closed
    }

    /// Registers the observer notified, in ascending pin order within a
    /// scan pass, for every accepted event. Replaces any previous handler.
    pub fn set_pin_changed_handler<F>(&self, handler: F)
    where
        F: Fn(GpioPin) + Send + Sync + 'static,
    {
        *self
            .shared
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    pub fn clear_pin_changed_handler(&self) {
        *self
            .shared
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Pins currently armed for background scanning.
    pub fn armed_pins(&self) -> Vec<GpioPin> {
        self.shared.lock_state().events.armed_pins()
    }

    /// Whether a scan thread is running (or starting).
    pub fn is_scanning(&self) -> bool {
        self.shared.lock_state().events.scanning
    }

    fn with_bank<T>(&self, f: impl FnOnce(&mut DriverState<B>) -> Result<T>) -> Result<T> {
        let mut state = self.shared.lock_state();
        if state.closed {
            return Err(Error::Closed);
        }
        if !state.bank.is_mapped() {
            debug!("Mapping GPIO registers on first use");
            state.bank.map()?;
        }
        f(&mut *state)
    }

    fn start_scanner(&self) -> Result<()> {
        let mut slot = self.scanner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            // Already past its exit check; this returns promptly.
            if previous.join().is_err() {
                warn!("Previous event scan thread panicked");
            }
        }
        if self.shared.stop.load(Ordering::Acquire) {
            // Closed between the arm and here; no thread will clear the flag.
            self.shared.lock_state().events.scanning = false;
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("gpio-event-scan".into())
            .spawn(move || scan_loop(shared))
        {
            Ok(handle) => {
                *slot = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.lock_state().events.scanning = false;
                Err(Error::Io(e))
            }
        }
    }

    fn join_scanner(&self) {
        let handle = self
            .scanner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Closed from inside the handler: the loop exits on its own.
            debug!("close() called from the event scan thread; not joining");
            return;
        }
        if handle.join().is_err() {
            warn!("Event scan thread panicked");
        }
    }
}

impl<B: RegisterBank> GpioDriver for Bcm2835Gpio<B> {
    fn gpio_set_mode(&self, pin: GpioPin, mode: PinMode) -> Result<()> {
        let settle = self.shared.settle.as_ref();
        self.with_bank(|state| mode::set_mode(&mut state.bank, settle, pin, mode))
    }

    fn gpio_get_mode(&self, pin: GpioPin) -> Result<PinMode> {
        self.with_bank(|state| mode::get_mode(&state.bank, pin))
    }

    fn gpio_write(&self, pin: GpioPin, value: PinValue) -> Result<()> {
        self.with_bank(|state| level::write_level(&mut state.bank, pin, value))
    }

    fn gpio_read(&self, pin: GpioPin) -> Result<PinValue> {
        self.with_bank(|state| level::read_level(&state.bank, pin))
    }

    fn gpio_set_events(&self, pin: GpioPin, events: PinEvent) -> Result<()> {
        let settle = self.shared.settle.as_ref();
        let start = self.with_bank(|state| {
            events::set_events(&mut state.bank, settle, pin, events)?;
            Ok(state.events.update_armed(pin, !events.is_empty()))
        })?;
        if start {
            debug!("Starting event scan thread");
            self.start_scanner()?;
        }
        Ok(())
    }

    fn gpio_get_events(&self, pin: GpioPin) -> Result<PinEvent> {
        self.with_bank(|state| events::get_events(&state.bank, pin))
    }

    fn gpio_was_event_detected(&self, pin: GpioPin) -> Result<bool> {
        let settle = self.shared.settle.as_ref();
        let clock = self.shared.clock.as_ref();
        self.with_bank(|state| {
            let DriverState { bank, events, .. } = state;
            events::poll_event(bank, settle, events, clock.now(), pin)
        })
    }

    fn convert_pin_number(
        &self,
        pin: u8,
        from: NumberingScheme,
        to: NumberingScheme,
    ) -> Result<u8> {
        self.numbering.convert(pin, from, to)
    }

    fn get_debounce(&self) -> Duration {
        self.shared.lock_state().events.debounce()
    }

    fn set_debounce(&self, debounce: Duration) {
        self.shared.lock_state().events.set_debounce(debounce);
    }
}

impl<B: RegisterBank> Drop for Bcm2835Gpio<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: RegisterBank> fmt::Debug for Bcm2835Gpio<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock_state();
        f.debug_struct("Bcm2835Gpio")
            .field("bank", &state.bank)
            .field("closed", &state.closed)
            .field("armed", &state.events.armed_count())
            .field("numbering", &self.numbering)
            .finish_non_exhaustive()
    }
}
