//! Function select and the pull-up/down handshake.

use crate::consts::{fsel, pud};
use crate::error::{Error, Result};
use crate::gpio::{GpioPin, PinMode};
use crate::registers::{Register, RegisterBank};
use crate::timing::Settle;
use log::{debug, trace};

/// Configures `pin` for `mode`. Input modes run the pull handshake first.
pub(crate) fn set_mode<B: RegisterBank + ?Sized>(
    bank: &mut B,
    settle: &dyn Settle,
    pin: GpioPin,
    mode: PinMode,
) -> Result<()> {
    debug!("Setting {} mode: {:?}", pin, mode);
    if let Some(code) = mode.pull_code() {
        run_pull_sequence(bank, settle, pin, code)?;
    }
    let shift = pin.fsel_shift();
    bank.write_field(
        Register::Gpfsel,
        pin.fsel_index(),
        fsel::FIELD_MASK << shift,
        mode.function_select() << shift,
    )
}

/// Reads back the mode. Pull direction is not recoverable from hardware, so
/// any input reads as [`PinMode::Input`].
pub(crate) fn get_mode<B: RegisterBank + ?Sized>(bank: &B, pin: GpioPin) -> Result<PinMode> {
    let word = bank.read_field(Register::Gpfsel, pin.fsel_index())?;
    let raw = (word >> pin.fsel_shift()) & fsel::FIELD_MASK;
    trace!("Read {} function select: 0b{:03b}", pin, raw);
    match raw {
        fsel::INPUT => Ok(PinMode::Input),
        fsel::OUTPUT => Ok(PinMode::Output),
        raw => Err(Error::UnsupportedPinMode {
            pin: pin.number(),
            raw,
        }),
    }
}

/// Latches pull control `code` into `pin`.
///
/// Order is fixed by the hardware: control code, settle, clock pulse,
/// settle, release control, release clock.
pub(crate) fn run_pull_sequence<B: RegisterBank + ?Sized>(
    bank: &mut B,
    settle: &dyn Settle,
    pin: GpioPin,
    code: u32,
) -> Result<()> {
    trace!("Pull handshake for {}: code=0b{:02b}", pin, code);
    bank.write_field(Register::Gppud, 0, pud::CONTROL_MASK, code)?;
    settle.settle();
    bank.set_bit(Register::Gppudclk, pin.word_index(), pin.bit_index())?;
    settle.settle();
    bank.write_field(Register::Gppud, 0, pud::CONTROL_MASK, pud::OFF)?;
    bank.write_word(Register::Gppudclk, pin.word_index(), 0)
}
