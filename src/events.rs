//! Edge/level event detection: enable registers, latched status, debounce.
//!
//! The per-pin armed flags and debounce timestamps live in [`EventState`],
//! which the driver keeps under the same lock as the register bank. The scan
//! thread itself is owned by the driver; [`scan_pass`] is one sweep of it.

use crate::consts::PIN_COUNT;
use crate::error::Result;
use crate::gpio::{GpioPin, PinEvent};
use crate::registers::{Register, RegisterBank};
use crate::timing::Settle;
use log::{debug, trace, warn};
use std::time::{Duration, Instant};

/// Enable register for each event kind.
pub(crate) const EVENT_REGISTERS: [(PinEvent, Register); 6] = [
    (PinEvent::LOW, Register::Gplen),
    (PinEvent::HIGH, Register::Gphen),
    (PinEvent::SYNC_RISING_EDGE, Register::Gpren),
    (PinEvent::SYNC_FALLING_EDGE, Register::Gpfen),
    (PinEvent::ASYNC_RISING_EDGE, Register::Gparen),
    (PinEvent::ASYNC_FALLING_EDGE, Register::Gpafen),
];

const PINS: usize = PIN_COUNT as usize;

/// Armed flags, armed count and per-pin debounce timestamps.
#[derive(Debug)]
pub(crate) struct EventState {
    armed: [bool; PINS],
    armed_count: usize,
    last_event: [Option<Instant>; PINS],
    debounce: Duration,
    /// Set while a scan thread is running or about to start.
    pub(crate) scanning: bool,
}

impl EventState {
    pub(crate) fn new(debounce: Duration) -> Self {
        EventState {
            armed: [false; PINS],
            armed_count: 0,
            last_event: [None; PINS],
            debounce,
            scanning: false,
        }
    }

    pub(crate) fn debounce(&self) -> Duration {
        self.debounce
    }

    pub(crate) fn set_debounce(&mut self, debounce: Duration) {
        debug!("Setting event debounce to {:?}", debounce);
        self.debounce = debounce;
    }

    pub(crate) fn armed_count(&self) -> usize {
        self.armed_count
    }

    pub(crate) fn is_armed(&self, pin: GpioPin) -> bool {
        self.armed[usize::from(pin.number())]
    }

    pub(crate) fn armed_pins(&self) -> Vec<GpioPin> {
        GpioPin::all().filter(|&pin| self.is_armed(pin)).collect()
    }

    /// Records whether `pin` is armed. Returns `true` when a scan thread
    /// has to be started; `scanning` is already set in that case.
    pub(crate) fn update_armed(&mut self, pin: GpioPin, armed: bool) -> bool {
        let slot = &mut self.armed[usize::from(pin.number())];
        match (*slot, armed) {
            (false, true) => self.armed_count += 1,
            (true, false) => self.armed_count -= 1,
            _ => {}
        }
        *slot = armed;
        if self.armed_count > 0 && !self.scanning {
            self.scanning = true;
            true
        } else {
            false
        }
    }

    /// Applies debounce to a hardware event seen at `now`.
    pub(crate) fn accept(&mut self, pin: GpioPin, now: Instant) -> bool {
        let slot = &mut self.last_event[usize::from(pin.number())];
        match *slot {
            Some(last) if now.saturating_duration_since(last) < self.debounce => {
                trace!(
                    "Suppressed event on {} ({:?} since last)",
                    pin,
                    now.saturating_duration_since(last)
                );
                false
            }
            last => {
                *slot = Some(last.map_or(now, |last| last.max(now)));
                true
            }
        }
    }
}

/// Writes all six enable bits of `pin` from `events`, then clears its latch.
pub(crate) fn set_events<B: RegisterBank + ?Sized>(
    bank: &mut B,
    settle: &dyn Settle,
    pin: GpioPin,
    events: PinEvent,
) -> Result<()> {
    debug!("Setting {} events to detect: {:?}", pin, events);
    for (kind, register) in EVENT_REGISTERS {
        if events.contains(kind) {
            bank.set_bit(register, pin.word_index(), pin.bit_index())?;
        } else {
            bank.clear_bit(register, pin.word_index(), pin.bit_index())?;
        }
    }
    clear_status(bank, settle, pin)
}

pub(crate) fn get_events<B: RegisterBank + ?Sized>(bank: &B, pin: GpioPin) -> Result<PinEvent> {
    let mut events = PinEvent::NONE;
    for (kind, register) in EVENT_REGISTERS {
        if bank.read_bit(register, pin.word_index(), pin.bit_index())? {
            events |= kind;
        }
    }
    Ok(events)
}

/// Pulses the pin's GPEDS bit: write 1, settle, write 0.
///
/// GPEDS is write-1-to-clear, so only the pin's own bit is stored. Merging
/// with the current word would clear every other latched pin in it.
pub(crate) fn clear_status<B: RegisterBank + ?Sized>(
    bank: &mut B,
    settle: &dyn Settle,
    pin: GpioPin,
) -> Result<()> {
    bank.write_word(Register::Gpeds, pin.word_index(), pin.mask())?;
    settle.settle();
    bank.write_word(Register::Gpeds, pin.word_index(), 0)
}

/// Checks and clears the latched event of `pin`.
///
/// Returns `true` only for a detection that passes debounce; the latch is
/// cleared whether or not the event is accepted.
pub(crate) fn poll_event<B: RegisterBank + ?Sized>(
    bank: &mut B,
    settle: &dyn Settle,
    state: &mut EventState,
    now: Instant,
    pin: GpioPin,
) -> Result<bool> {
    if !bank.read_bit(Register::Gpeds, pin.word_index(), pin.bit_index())? {
        return Ok(false);
    }
    clear_status(bank, settle, pin)?;
    Ok(state.accept(pin, now))
}

/// One sweep over all armed pins in ascending order. Returns the pins whose
/// events were accepted. Register faults are logged and the pin skipped.
pub(crate) fn scan_pass<B: RegisterBank + ?Sized>(
    bank: &mut B,
    settle: &dyn Settle,
    state: &mut EventState,
    now: Instant,
) -> Vec<GpioPin> {
    let mut accepted = Vec::new();
    for pin in GpioPin::all() {
        if !state.is_armed(pin) {
            continue;
        }
        match poll_event(bank, settle, state, now, pin) {
            Ok(true) => accepted.push(pin),
            Ok(false) => {}
            Err(e) => warn!("Event scan skipped {}: {}", pin, e),
        }
    }
    accepted
}
