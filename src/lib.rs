//! # bcm-gpiomem
//!
//! A Rust crate for controlling the GPIO pins of Broadcom BCM283x system-on-chips
//! (Raspberry Pi 1-3, Zero) from user space by mapping the GPIO register bank
//! into process memory.
//!
//! The registers are mapped from `/dev/gpiomem` (or `/dev/mem`) using `memmap2`
//! and manipulated with bounds-checked read-modify-write operations.
//!
//! ## Features
//!
//! *   Lazy mapping of the register page on first use, explicit `initialize`/`close`.
//! *   Strongly-typed `GpioPin` struct (BCM pins 0-53).
//! *   Pin mode control (`gpio_set_mode`, `gpio_get_mode`):
//!     *   Input and output function select.
//!     *   Pull-up/pull-down resistors through the timed GPPUD/GPPUDCLK handshake.
//! *   Digital I/O through the set/clear/level registers (`gpio_write`, `gpio_read`).
//! *   Event detection (`gpio_set_events`, `gpio_get_events`, `gpio_was_event_detected`):
//!     *   Level high/low, synchronous and asynchronous rising/falling edges.
//!     *   Software debounce shared by all pins.
//!     *   Background scan thread notifying a pin-changed handler.
//! *   Pin number conversion between logical (BCM) and board numbering using a
//!     caller-supplied pin table.
//! *   A simulated in-memory register file for testing code without hardware.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use bcm_gpiomem::{DriverConfig, GpioDriver, GpioPin, MappedGpio, PinMode, PinValue, Result};
//!
//! fn main() -> Result<()> {
//!     let gpio = MappedGpio::open(DriverConfig::gpiomem())?;
//!     let led = GpioPin::new(17)?;
//!     gpio.gpio_set_mode(led, PinMode::Output)?;
//!     gpio.gpio_write(led, PinValue::High)?;
//!     println!("Pin {} is {:?}", led.number(), gpio.gpio_read(led)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Event Detection
//!
//! ```no_run
//! use bcm_gpiomem::{DriverConfig, GpioDriver, GpioPin, MappedGpio, PinEvent, PinMode};
//! use std::time::Duration;
//!
//! # fn main() -> bcm_gpiomem::Result<()> {
//! let config = DriverConfig::gpiomem().with_debounce(Duration::from_millis(50));
//! let gpio = MappedGpio::open(config)?;
//! let button = GpioPin::new(27)?;
//! gpio.gpio_set_mode(button, PinMode::InputPullUp)?;
//! gpio.set_pin_changed_handler(|pin| println!("{} pressed", pin));
//! gpio.gpio_set_events(button, PinEvent::SYNC_FALLING_EDGE)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing Without Hardware
//!
//! ```
//! use bcm_gpiomem::{DriverConfig, GpioDriver, GpioPin, PinValue, Register, SimulatedGpio,
//!     SimulatedRegisters};
//!
//! let registers = SimulatedRegisters::new();
//! let gpio = SimulatedGpio::simulated(registers.clone(), DriverConfig::default());
//! gpio.gpio_write(GpioPin::new(4).unwrap(), PinValue::High).unwrap();
//! assert_eq!(registers.peek(Register::Gpset, 0), 0x10);
//! ```
//!
//! ## Hardware Setup Notes
//!
//! *   `/dev/gpiomem` is readable by members of the `gpio` group; `/dev/mem`
//!     requires root and the SoC peripheral base (`DriverConfig::devmem`).
//! *   The pull handshake and status clears use busy-wait settle delays of at
//!     least 150 core cycles.
//! *   The event scan thread polls continuously while any pin is armed and
//!     stops when the last pin is disarmed or the driver is closed.
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

mod config;
mod consts;
mod driver;
mod error;
mod events;
pub mod gpio; // Keep gpio public for its enums/structs
mod level;
mod mapped;
mod mode;
pub mod numbering;
pub mod registers;
mod simulated;
pub mod timing;

pub use config::DriverConfig;
pub use driver::{Bcm2835Gpio, GpioDriver, MappedGpio, PinChangedHandler, SimulatedGpio};
pub use error::{Error, Result};
pub use gpio::{GpioPin, NumberingScheme, PinEvent, PinMode, PinValue};
pub use mapped::MappedRegisters;
pub use numbering::{BoardPinMap, PinNumbering};
pub use registers::{Register, RegisterBank};
pub use simulated::{RegisterWrite, SimulatedRegisters};
pub use timing::{BusyWait, Clock, ManualClock, NoSettle, Settle, SystemClock};
// Re-export only essential public constants
pub use consts::{DEFAULT_DEVICE_PATH, MIN_SETTLE_CYCLES, PIN_COUNT};
