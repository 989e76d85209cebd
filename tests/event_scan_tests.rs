//! Background event scanning, lifecycle, and concurrent access.

use bcm_gpiomem::{
    Bcm2835Gpio, DriverConfig, Error, GpioDriver, GpioPin, NoSettle, PinEvent, PinMode, PinValue,
    Register, RegisterBank, SimulatedGpio, SimulatedRegisters, SystemClock,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn simulated() -> (Arc<SimulatedGpio>, SimulatedRegisters) {
    init_logging();
    let registers = SimulatedRegisters::new();
    let gpio = SimulatedGpio::simulated(registers.clone(), DriverConfig::default());
    (Arc::new(gpio), registers)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

fn pin(n: u8) -> GpioPin {
    GpioPin::new(n).unwrap()
}

#[test]
fn test_scanner_notifies_and_clears_latch() {
    let (gpio, registers) = simulated();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    gpio.set_pin_changed_handler(move |pin| sink.lock().unwrap().push(pin.number()));

    assert!(!gpio.is_scanning());
    gpio.gpio_set_events(pin(22), PinEvent::SYNC_RISING_EDGE).unwrap();
    assert!(gpio.is_scanning());
    assert_eq!(gpio.armed_pins(), vec![pin(22)]);

    registers.poke(Register::Gpeds, 0, 1 << 22);
    assert!(wait_until(|| seen.lock().unwrap().len() == 1));
    assert_eq!(*seen.lock().unwrap(), vec![22]);
    assert!(wait_until(|| registers.peek(Register::Gpeds, 0) == 0));
}

#[test]
fn test_scanner_ignores_unarmed_pins() {
    let (gpio, registers) = simulated();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    gpio.set_pin_changed_handler(move |pin| sink.lock().unwrap().push(pin.number()));

    gpio.gpio_set_events(pin(1), PinEvent::HIGH).unwrap();
    registers.poke(Register::Gpeds, 0, (1 << 2) | (1 << 1));
    assert!(wait_until(|| seen.lock().unwrap().len() == 1));
    // Let a few more passes run
    thread::sleep(Duration::from_millis(20));
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert_eq!(registers.peek(Register::Gpeds, 0), 1 << 2);
}

#[test]
fn test_notifications_ascending_within_pass() {
    let (gpio, registers) = simulated();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);

    let sink = Arc::clone(&seen);
    gpio.set_pin_changed_handler(move |pin| {
        sink.lock().unwrap().push(pin.number());
        if pin.number() == 50 {
            // Hold the scanner between passes while the test latches more pins
            entered_tx.lock().unwrap().send(()).unwrap();
            let _ = release_rx.lock().unwrap().recv_timeout(WAIT);
        }
    });

    for n in [20, 3, 50, 10] {
        gpio.gpio_set_events(pin(n), PinEvent::SYNC_FALLING_EDGE).unwrap();
    }
    registers.poke(Register::Gpeds, 1, 1 << 18);
    entered_rx.recv_timeout(WAIT).unwrap();
    registers.poke(Register::Gpeds, 0, (1 << 3) | (1 << 10) | (1 << 20));
    release_tx.send(()).unwrap();

    assert!(wait_until(|| seen.lock().unwrap().len() == 4));
    assert_eq!(*seen.lock().unwrap(), vec![50, 3, 10, 20]);
}

#[test]
fn test_scanner_stops_on_last_disarm_and_restarts() {
    let (gpio, registers) = simulated();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    gpio.set_pin_changed_handler(move |pin| sink.lock().unwrap().push(pin.number()));

    gpio.gpio_set_events(pin(5), PinEvent::LOW).unwrap();
    gpio.gpio_set_events(pin(6), PinEvent::LOW).unwrap();
    gpio.gpio_set_events(pin(5), PinEvent::NONE).unwrap();
    assert!(gpio.is_scanning());
    gpio.gpio_set_events(pin(6), PinEvent::NONE).unwrap();
    assert!(wait_until(|| !gpio.is_scanning()));

    gpio.gpio_set_events(pin(6), PinEvent::ASYNC_RISING_EDGE).unwrap();
    assert!(gpio.is_scanning());
    registers.poke(Register::Gpeds, 0, 1 << 6);
    assert!(wait_until(|| seen.lock().unwrap().len() == 1));
    assert_eq!(*seen.lock().unwrap(), vec![6]);
}

#[test]
fn test_close_joins_scanner_before_unmapping() {
    let (gpio, registers) = simulated();
    gpio.gpio_set_events(pin(30), PinEvent::HIGH).unwrap();
    assert!(gpio.is_scanning());

    gpio.close();
    assert!(!gpio.is_scanning());
    assert!(!registers.is_mapped());
    assert!(matches!(
        gpio.gpio_set_events(pin(30), PinEvent::HIGH),
        Err(Error::Closed)
    ));
    assert!(matches!(
        gpio.gpio_was_event_detected(pin(30)),
        Err(Error::Closed)
    ));
    assert!(!gpio.is_scanning());
}

#[test]
fn test_handler_may_call_back_into_driver() {
    let (gpio, registers) = simulated();
    let weak = Arc::downgrade(&gpio);
    let (done_tx, done_rx) = mpsc::channel();
    let done_tx = Mutex::new(done_tx);
    gpio.set_pin_changed_handler(move |pin| {
        if let Some(gpio) = weak.upgrade() {
            let events = gpio.gpio_get_events(pin).unwrap();
            gpio.gpio_set_events(pin, PinEvent::NONE).unwrap();
            done_tx.lock().unwrap().send(events).unwrap();
        }
    });

    gpio.gpio_set_events(pin(45), PinEvent::SYNC_RISING_EDGE).unwrap();
    registers.poke(Register::Gpeds, 1, 1 << 13);
    assert_eq!(done_rx.recv_timeout(WAIT).unwrap(), PinEvent::SYNC_RISING_EDGE);
    assert!(wait_until(|| !gpio.is_scanning()));
    assert!(gpio.armed_pins().is_empty());
}

#[test]
fn test_panicking_handler_does_not_stop_scanner() {
    let (gpio, registers) = simulated();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    gpio.set_pin_changed_handler(move |pin| {
        sink.lock().unwrap().push(pin.number());
        if pin.number() == 7 {
            panic!("handler failure");
        }
    });

    gpio.gpio_set_events(pin(7), PinEvent::HIGH).unwrap();
    gpio.gpio_set_events(pin(8), PinEvent::HIGH).unwrap();
    registers.poke(Register::Gpeds, 0, 1 << 7);
    assert!(wait_until(|| seen.lock().unwrap().len() == 1));
    registers.poke(Register::Gpeds, 0, 1 << 8);
    assert!(wait_until(|| seen.lock().unwrap().len() == 2));
    assert!(gpio.is_scanning());
}

#[test]
fn test_concurrent_access_stress() {
    let (gpio, registers) = simulated();
    let notified = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&notified);
    gpio.set_pin_changed_handler(move |_| *counter.lock().unwrap() += 1);

    // Scanner keeps clearing latches of pins 0-3 while the workers below
    // read-modify-write neighbouring bits of the same registers.
    for n in 0..4 {
        gpio.gpio_set_events(pin(n), PinEvent::SYNC_RISING_EDGE).unwrap();
    }
    let hardware = {
        let registers = registers.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                registers.poke(Register::Gpeds, 0, 0b1111);
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    let workers: Vec<_> = (0..4u8)
        .map(|t| {
            let gpio = Arc::clone(&gpio);
            thread::spawn(move || {
                let pins = [pin(10 + t), pin(42 + t)];
                for i in 0..300u32 {
                    for &p in &pins {
                        let mode = if i % 2 == 0 { PinMode::Output } else { PinMode::Input };
                        gpio.gpio_set_mode(p, mode).unwrap();
                        assert_eq!(gpio.gpio_get_mode(p).unwrap(), mode);

                        let events = PinEvent::from_raw((i + u32::from(t)) % 64).unwrap();
                        gpio.gpio_set_events(p, events).unwrap();
                        assert_eq!(gpio.gpio_get_events(p).unwrap(), events);

                        gpio.gpio_write(p, PinValue::from(i % 3 == 0)).unwrap();
                    }
                }
                for &p in &pins {
                    gpio.gpio_set_events(p, PinEvent::NONE).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }
    hardware.join().unwrap();

    for n in 0..4 {
        assert_eq!(gpio.gpio_get_events(pin(n)).unwrap(), PinEvent::SYNC_RISING_EDGE);
    }
    assert_eq!(gpio.armed_pins(), (0..4).map(pin).collect::<Vec<_>>());
    assert!(*notified.lock().unwrap() > 0);
    gpio.close();
    assert!(!registers.is_mapped());
}

/// Register file whose status word 1 reads fail while `faulty` is set.
#[derive(Debug, Clone)]
struct FlakyStatusRegisters {
    inner: SimulatedRegisters,
    faulty: Arc<AtomicBool>,
}

impl RegisterBank for FlakyStatusRegisters {
    fn map(&mut self) -> bcm_gpiomem::Result<()> {
        self.inner.map()
    }

    fn unmap(&mut self) {
        self.inner.unmap()
    }

    fn is_mapped(&self) -> bool {
        self.inner.is_mapped()
    }

    fn read_word(&self, register: Register, index: usize) -> bcm_gpiomem::Result<u32> {
        if register == Register::Gpeds && index == 1 && self.faulty.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::other("bus fault")));
        }
        self.inner.read_word(register, index)
    }

    fn write_word(
        &mut self,
        register: Register,
        index: usize,
        value: u32,
    ) -> bcm_gpiomem::Result<()> {
        self.inner.write_word(register, index, value)
    }
}

#[test]
fn test_scanner_skips_failing_pin_and_keeps_running() {
    init_logging();
    let registers = SimulatedRegisters::new();
    let faulty = Arc::new(AtomicBool::new(true));
    let bank = FlakyStatusRegisters {
        inner: registers.clone(),
        faulty: Arc::clone(&faulty),
    };
    let gpio = Bcm2835Gpio::from_parts(
        bank,
        Arc::new(NoSettle),
        Arc::new(SystemClock),
        DriverConfig::default(),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    gpio.set_pin_changed_handler(move |pin| sink.lock().unwrap().push(pin.number()));

    gpio.gpio_set_events(pin(3), PinEvent::SYNC_RISING_EDGE).unwrap();
    gpio.gpio_set_events(pin(40), PinEvent::SYNC_RISING_EDGE).unwrap();
    registers.poke(Register::Gpeds, 1, 1 << 8);
    registers.poke(Register::Gpeds, 0, 1 << 3);

    assert!(wait_until(|| seen.lock().unwrap().len() == 1));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(*seen.lock().unwrap(), vec![3]);
    assert!(gpio.is_scanning());
    assert_eq!(registers.peek(Register::Gpeds, 1), 1 << 8);

    // Fault clears: the latched event on pin 40 is picked up
    faulty.store(false, Ordering::SeqCst);
    assert!(wait_until(|| seen.lock().unwrap().len() == 2));
    assert_eq!(*seen.lock().unwrap(), vec![3, 40]);
    gpio.close();
}
