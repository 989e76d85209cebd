use crate::consts::{self, fsel, pud};
use crate::error::{self, Error, Result};
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

/// Pin function as managed by this driver.
///
/// Only plain input and output are supported. The pull variants are
/// configured through the pull handshake and read back as `Input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    Input,
    Output,
    InputPullUp,
    InputPullDown,
}

impl PinMode {
    /// Function select bits written for this mode.
    #[inline]
    pub(crate) fn function_select(self) -> u32 {
        match self {
            PinMode::Output => fsel::OUTPUT,
            PinMode::Input | PinMode::InputPullUp | PinMode::InputPullDown => fsel::INPUT,
        }
    }

    /// Pull control code for input modes; `None` for output.
    #[inline]
    pub(crate) fn pull_code(self) -> Option<u32> {
        match self {
            PinMode::Input => Some(pud::OFF),
            PinMode::InputPullDown => Some(pud::PULL_DOWN),
            PinMode::InputPullUp => Some(pud::PULL_UP),
            PinMode::Output => None,
        }
    }
}

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinValue {
    Low,
    High,
}

impl From<bool> for PinValue {
    fn from(high: bool) -> Self {
        if high {
            PinValue::High
        } else {
            PinValue::Low
        }
    }
}

impl TryFrom<u32> for PinValue {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(PinValue::Low),
            1 => Ok(PinValue::High),
            other => Err(Error::InvalidPinValue(other)),
        }
    }
}

bitflags! {
    /// Combinable set of edge/level conditions the hardware can latch for a pin.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PinEvent: u8 {
        const LOW = 1 << 0;
        const HIGH = 1 << 1;
        const SYNC_RISING_EDGE = 1 << 2;
        const SYNC_FALLING_EDGE = 1 << 3;
        const ASYNC_RISING_EDGE = 1 << 4;
        const ASYNC_FALLING_EDGE = 1 << 5;
    }
}

impl PinEvent {
    /// The empty combination: nothing is detected.
    pub const NONE: PinEvent = PinEvent::empty();

    /// Builds an event set from raw bits, rejecting unknown bits.
    pub fn from_raw(raw: u32) -> Result<Self> {
        u8::try_from(raw)
            .ok()
            .and_then(PinEvent::from_bits)
            .ok_or(Error::InvalidPinEvent(raw))
    }
}

/// Pin numbering schemes accepted by [`crate::GpioDriver::convert_pin_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberingScheme {
    /// SoC-native GPIO index (BCM numbering).
    Logical,
    /// Physical header position.
    Board,
}

impl fmt::Display for NumberingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingScheme::Logical => f.write_str("logical"),
            NumberingScheme::Board => f.write_str("board"),
        }
    }
}

impl FromStr for NumberingScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logical" | "bcm" => Ok(NumberingScheme::Logical),
            "board" | "physical" => Ok(NumberingScheme::Board),
            _ => Err(Error::UnsupportedNumberingScheme(s.to_string())),
        }
    }
}

/// Represents a valid BCM GPIO pin number (0-53).
/// Use `GpioPin::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpioPin(pub(crate) u8);

impl GpioPin {
    /// Creates a new GpioPin, returning an error if the number is out of range (0-53).
    pub fn new(pin_num: u8) -> Result<Self> {
        if pin_num < consts::PIN_COUNT {
            Ok(GpioPin(pin_num))
        } else {
            Err(error::pin_out_of_range(pin_num))
        }
    }

    /// Iterates every pin of the bank in ascending order.
    pub fn all() -> impl Iterator<Item = GpioPin> {
        (0..consts::PIN_COUNT).map(GpioPin)
    }

    /// Returns the underlying pin number (0-53).
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Index of the 32-bit word holding this pin in the per-pin bitmap registers.
    #[inline]
    pub fn word_index(&self) -> usize {
        usize::from(self.0 / 32)
    }

    /// Returns the bit index (0-31) within the word.
    #[inline]
    pub fn bit_index(&self) -> u8 {
        self.0 % 32
    }

    /// Returns the bit mask (1 << bit_index) for register operations.
    #[inline]
    pub fn mask(&self) -> u32 {
        1u32 << self.bit_index()
    }

    /// Word index of the pin's 3-bit function select field.
    #[inline]
    pub(crate) fn fsel_index(&self) -> usize {
        usize::from(self.0 / fsel::PINS_PER_WORD)
    }

    /// Bit shift of the pin's 3-bit function select field.
    #[inline]
    pub(crate) fn fsel_shift(&self) -> u8 {
        (self.0 % fsel::PINS_PER_WORD) * fsel::FIELD_WIDTH
    }
}

impl TryFrom<i32> for GpioPin {
    type Error = Error;

    fn try_from(pin_num: i32) -> Result<Self> {
        u8::try_from(pin_num)
            .map_err(|_| error::pin_out_of_range(pin_num))
            .and_then(GpioPin::new)
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}
