//! Button Events
//!
//! Arms a push button for falling-edge detection and prints every debounced
//! press reported by the background scan thread.
//!
//! ## Hardware Requirements
//!
//! - Raspberry Pi with `/dev/gpiomem`
//! - Push button between the chosen pin and ground (the internal pull-up is used)
//!
//! Usage: `cargo run --example button_events -- [BCM pin] [debounce ms]`

use std::env;
use std::sync::mpsc;
use std::time::Duration;

use log::{error, info};

use bcm_gpiomem::{DriverConfig, GpioDriver, GpioPin, MappedGpio, PinEvent, PinMode};

const DEFAULT_BUTTON_PIN: u8 = 27;
const DEFAULT_DEBOUNCE_MS: u64 = 50;
const PRESSES_TO_EXIT: usize = 10;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let pin_num = match args.next() {
        Some(arg) => arg.parse()?,
        None => DEFAULT_BUTTON_PIN,
    };
    let debounce_ms = match args.next() {
        Some(arg) => arg.parse()?,
        None => DEFAULT_DEBOUNCE_MS,
    };

    let button = GpioPin::new(pin_num)?;
    let config = DriverConfig::gpiomem().with_debounce(Duration::from_millis(debounce_ms));
    let gpio = MappedGpio::open(config)?;
    info!("Mapped GPIO registers, debounce {:?}", gpio.get_debounce());

    gpio.gpio_set_mode(button, PinMode::InputPullUp)?;

    let (tx, rx) = mpsc::channel();
    gpio.set_pin_changed_handler(move |pin| {
        if tx.send(pin).is_err() {
            error!("Press on {} dropped: receiver gone", pin);
        }
    });
    gpio.gpio_set_events(button, PinEvent::SYNC_FALLING_EDGE)?;
    info!(
        "Waiting for {} presses on {} (events: {:?})",
        PRESSES_TO_EXIT,
        button,
        gpio.gpio_get_events(button)?
    );

    for count in 1..=PRESSES_TO_EXIT {
        let pin = rx.recv()?;
        info!("Press {} on {} (level now {:?})", count, pin, gpio.gpio_read(pin)?);
    }

    gpio.gpio_set_events(button, PinEvent::NONE)?;
    gpio.close();
    info!("Done");
    Ok(())
}
