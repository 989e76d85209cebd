//! Digital level output (set/clear registers) and input (level register).

use crate::error::Result;
use crate::gpio::{GpioPin, PinValue};
use crate::registers::{Register, RegisterBank};
use log::trace;

/// Drives `pin` to `value` by setting its bit in GPSET or GPCLR.
pub(crate) fn write_level<B: RegisterBank + ?Sized>(
    bank: &mut B,
    pin: GpioPin,
    value: PinValue,
) -> Result<()> {
    let register = match value {
        PinValue::High => Register::Gpset,
        PinValue::Low => Register::Gpclr,
    };
    trace!(
        "Setting {} {:?} (bit {} of {:?}[{}])",
        pin,
        value,
        pin.bit_index(),
        register,
        pin.word_index()
    );
    // Read-modify-write is harmless: GPSET/GPCLR read back as zero on hardware.
    bank.set_bit(register, pin.word_index(), pin.bit_index())
}

pub(crate) fn read_level<B: RegisterBank + ?Sized>(bank: &B, pin: GpioPin) -> Result<PinValue> {
    let high = bank.read_bit(Register::Gplev, pin.word_index(), pin.bit_index())?;
    Ok(PinValue::from(high))
}
