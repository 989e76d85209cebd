use bcm_gpiomem::{DriverConfig, GpioDriver, GpioPin, MappedGpio, PinMode, PinValue, Result};
use std::{thread, time::Duration};

// BCM 17 (board pin 11)
const BLINK_PIN_NUM: u8 = 17;

fn main() -> Result<()> {
    env_logger::init();
    println!("Mapping GPIO registers from /dev/gpiomem...");
    let gpio = MappedGpio::open(DriverConfig::gpiomem())?;
    println!("Registers mapped.");

    let blink_pin = GpioPin::new(BLINK_PIN_NUM)?;

    println!("Configuring pin {} for blinking...", blink_pin.number());
    gpio.gpio_set_mode(blink_pin, PinMode::Output)?;

    println!("Blinking pin {} (Press Ctrl+C to stop)", blink_pin.number());
    loop {
        gpio.gpio_write(blink_pin, PinValue::High)?;
        thread::sleep(Duration::from_millis(250));
        gpio.gpio_write(blink_pin, PinValue::Low)?;
        thread::sleep(Duration::from_millis(250));
    }
    // Note: Loop runs forever; the mapping is released when the process exits
}
