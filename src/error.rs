use crate::gpio::NumberingScheme;
use crate::registers::Register;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when driving the BCM283x GPIO register bank.
///
/// Argument validation failures are reported before any register is touched.
/// Mapping failures are reported by the first operation that needs the bank.
#[derive(Error, Debug)]
pub enum Error {
    /// The GPIO memory device could not be opened.
    #[error("Failed to open GPIO memory device '{}': {source}. Check that it exists and that you have permission (e.g. membership of the 'gpio' group)", .path.display())]
    DeviceOpen {
        /// Path of the device node.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The register page could not be mapped into process memory.
    #[error("Failed to map GPIO registers from '{}' at offset 0x{offset:08X}: {source}", .path.display())]
    Mapping {
        /// Path of the device node.
        path: PathBuf,
        /// Byte offset requested from the device.
        offset: u64,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A register was accessed while the bank is not mapped.
    #[error("GPIO register bank is not mapped")]
    NotMapped,
    /// A word index past the end of a register group was requested.
    #[error("Word {index} is out of bounds for register {register:?} ({words} words)")]
    RegisterOutOfBounds {
        /// The register group being accessed.
        register: Register,
        /// Requested word index.
        index: usize,
        /// Number of words in the group.
        words: usize,
    },
    /// GPIO pin number is outside the valid range for this chip.
    #[error("GPIO pin {pin} argument out of range (0-53): {message}")]
    PinArgumentOutOfRange {
        /// The invalid pin number that was specified.
        pin: i64,
        /// Detailed error message explaining the constraint.
        message: String,
    },
    /// The function select bits hold a mode this driver does not manage.
    #[error("GPIO pin {pin} is in unsupported mode (function select 0b{raw:03b})")]
    UnsupportedPinMode {
        /// Pin whose mode was read.
        pin: u8,
        /// Raw function select value.
        raw: u32,
    },
    /// A raw pin value other than 0 or 1 was supplied.
    #[error("Invalid pin value {0}, expected 0 (Low) or 1 (High)")]
    InvalidPinValue(u32),
    /// A raw event set contains bits outside the six known event kinds.
    #[error("Invalid pin event combination 0x{0:02X}")]
    InvalidPinEvent(u32),
    /// The requested numbering scheme is not known.
    #[error("Unsupported pin numbering scheme '{0}'")]
    UnsupportedNumberingScheme(String),
    /// A conversion between numbering schemes was requested but no pin table is configured.
    #[error("Cannot convert pin {pin} from {from:?} to {to:?} numbering: no board pin table configured")]
    UnsupportedConversion {
        /// Pin number in the source scheme.
        pin: u8,
        /// Source scheme.
        from: NumberingScheme,
        /// Target scheme.
        to: NumberingScheme,
    },
    /// The configured board pin table has no entry for the pin.
    #[error("Pin {pin} ({scheme:?} numbering) has no entry in the board pin table")]
    UnmappedPin {
        /// Pin number that was looked up.
        pin: u8,
        /// Scheme the pin number belongs to.
        scheme: NumberingScheme,
    },
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// The driver has been closed; no further register access is allowed.
    #[error("GPIO driver has been closed")]
    Closed,
    /// General I/O error (e.g. failure to spawn the event scan thread).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GPIO driver operations.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn pin_out_of_range(pin: impl Into<i64>) -> Error {
    Error::PinArgumentOutOfRange {
        pin: pin.into(),
        message: "Pin number must be 0-53".to_string(),
    }
}
