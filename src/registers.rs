//! Register map of the GPIO peripheral and the bit-field access layer.
//!
//! Every register group is described by a fixed `(offset, words)` pair.
//! Backends only ever see a [`Register`] and a word index; the byte offset is
//! computed and bounds-checked here, never by raw address arithmetic.

use crate::consts::regs;
use crate::error::{Error, Result};
use log::trace;

/// Named register groups of the GPIO block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Function select, 3 bits per pin.
    Gpfsel,
    /// Output set (write 1 drives high).
    Gpset,
    /// Output clear (write 1 drives low).
    Gpclr,
    /// Pin level.
    Gplev,
    /// Event detect status (latched).
    Gpeds,
    /// Synchronous rising edge detect enable.
    Gpren,
    /// Synchronous falling edge detect enable.
    Gpfen,
    /// High level detect enable.
    Gphen,
    /// Low level detect enable.
    Gplen,
    /// Asynchronous rising edge detect enable.
    Gparen,
    /// Asynchronous falling edge detect enable.
    Gpafen,
    /// Pull-up/down control code.
    Gppud,
    /// Pull-up/down clock.
    Gppudclk,
}

impl Register {
    pub const ALL: [Register; 13] = [
        Register::Gpfsel,
        Register::Gpset,
        Register::Gpclr,
        Register::Gplev,
        Register::Gpeds,
        Register::Gpren,
        Register::Gpfen,
        Register::Gphen,
        Register::Gplen,
        Register::Gparen,
        Register::Gpafen,
        Register::Gppud,
        Register::Gppudclk,
    ];

    /// Byte offset of word 0 from the mapping base.
    pub const fn offset(self) -> usize {
        match self {
            Register::Gpfsel => regs::GPFSEL,
            Register::Gpset => regs::GPSET,
            Register::Gpclr => regs::GPCLR,
            Register::Gplev => regs::GPLEV,
            Register::Gpeds => regs::GPEDS,
            Register::Gpren => regs::GPREN,
            Register::Gpfen => regs::GPFEN,
            Register::Gphen => regs::GPHEN,
            Register::Gplen => regs::GPLEN,
            Register::Gparen => regs::GPAREN,
            Register::Gpafen => regs::GPAFEN,
            Register::Gppud => regs::GPPUD,
            Register::Gppudclk => regs::GPPUDCLK,
        }
    }

    /// Number of 32-bit words in the group.
    pub const fn words(self) -> usize {
        match self {
            Register::Gpfsel => regs::GPFSEL_WORDS,
            Register::Gppud => 1,
            _ => regs::BANK_WORDS,
        }
    }

    /// Bounds-checked byte offset of word `index`.
    pub fn byte_offset(self, index: usize) -> Result<usize> {
        if index < self.words() {
            Ok(self.offset() + index * 4)
        } else {
            Err(Error::RegisterOutOfBounds {
                register: self,
                index,
                words: self.words(),
            })
        }
    }
}

/// Storage behind the GPIO register map.
///
/// Implementors provide word access and the mapping lifecycle; the provided
/// methods implement the single-load, masked-merge, single-store field
/// primitives used by every controller. Nothing here is atomic across
/// threads: callers serialize access (see [`crate::Bcm2835Gpio`]).
pub trait RegisterBank: Send + std::fmt::Debug + 'static {
    /// Establishes the mapping. Called lazily by the driver.
    fn map(&mut self) -> Result<()>;

    /// Releases the mapping. A no-op when not mapped.
    fn unmap(&mut self);

    fn is_mapped(&self) -> bool;

    /// Loads one 32-bit word of a register group.
    fn read_word(&self, register: Register, index: usize) -> Result<u32>;

    /// Stores one 32-bit word of a register group.
    fn write_word(&mut self, register: Register, index: usize, value: u32) -> Result<()>;

    /// Reads a whole word for field extraction by the caller.
    fn read_field(&self, register: Register, index: usize) -> Result<u32> {
        let value = self.read_word(register, index)?;
        trace!("Read {:?}[{}] = 0x{:08X}", register, index, value);
        Ok(value)
    }

    /// Replaces the bits selected by `mask` with the matching bits of `value`.
    fn write_field(
        &mut self,
        register: Register,
        index: usize,
        mask: u32,
        value: u32,
    ) -> Result<()> {
        let current = self.read_word(register, index)?;
        let merged = (current & !mask) | (value & mask);
        trace!(
            "Write {:?}[{}]: mask=0x{:08X}, 0x{:08X} -> 0x{:08X}",
            register,
            index,
            mask,
            current,
            merged
        );
        self.write_word(register, index, merged)
    }

    fn read_bit(&self, register: Register, index: usize, bit: u8) -> Result<bool> {
        Ok(self.read_field(register, index)? & (1u32 << bit) != 0)
    }

    fn set_bit(&mut self, register: Register, index: usize, bit: u8) -> Result<()> {
        let mask = 1u32 << bit;
        self.write_field(register, index, mask, mask)
    }

    fn clear_bit(&mut self, register: Register, index: usize, bit: u8) -> Result<()> {
        self.write_field(register, index, 1u32 << bit, 0)
    }
}
