//! In-memory register file with the same layout as the hardware bank.
//!
//! Clones share storage, so a test can hand one clone to the driver and keep
//! another to play the hardware side: poke level and status bits, peek at
//! what the driver wrote, and inspect the ordered write journal.

use crate::consts::regs;
use crate::error::{Error, Result};
use crate::registers::{Register, RegisterBank};
use log::debug;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A single store recorded by [`SimulatedRegisters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: Register,
    pub index: usize,
    pub value: u32,
}

#[derive(Debug, Default)]
struct SimState {
    words: Vec<u32>,
    mapped: bool,
    fail_map: bool,
    journal: Vec<RegisterWrite>,
}

/// Plain-memory stand-in for the GPIO register page.
///
/// Writes land verbatim, so set/clear registers keep the bits written to
/// them. The event status register is write-1-to-clear as on the chip.
/// Latching events and driving levels is up to the test, through
/// [`SimulatedRegisters::poke`].
#[derive(Debug, Clone)]
pub struct SimulatedRegisters {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRegisters {
    pub fn new() -> Self {
        SimulatedRegisters {
            state: Arc::new(Mutex::new(SimState {
                words: vec![0; regs::SPAN / 4],
                ..SimState::default()
            })),
        }
    }

    /// A register file whose `map` always fails, as if the device were missing.
    pub fn failing() -> Self {
        let sim = Self::new();
        sim.lock().fail_map = true;
        sim
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(register: Register, index: usize) -> Result<usize> {
        Ok(register.byte_offset(index)? / 4)
    }

    /// Reads a word regardless of mapping state.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds for `register`.
    pub fn peek(&self, register: Register, index: usize) -> u32 {
        let slot = Self::slot(register, index).expect("register index out of bounds");
        self.lock().words[slot]
    }

    /// Overwrites a word as the hardware would, without journaling.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds for `register`.
    pub fn poke(&self, register: Register, index: usize, value: u32) {
        let slot = Self::slot(register, index).expect("register index out of bounds");
        self.lock().words[slot] = value;
    }

    /// Returns and clears the recorded stores, oldest first.
    pub fn take_journal(&self) -> Vec<RegisterWrite> {
        std::mem::take(&mut self.lock().journal)
    }
}

impl RegisterBank for SimulatedRegisters {
    fn map(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.fail_map {
            return Err(Error::DeviceOpen {
                path: PathBuf::from("<simulated>"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "simulated failure"),
            });
        }
        if !state.mapped {
            debug!("Mapped simulated GPIO registers");
            state.mapped = true;
        }
        Ok(())
    }

    fn unmap(&mut self) {
        self.lock().mapped = false;
    }

    fn is_mapped(&self) -> bool {
        self.lock().mapped
    }

    fn read_word(&self, register: Register, index: usize) -> Result<u32> {
        let slot = Self::slot(register, index)?;
        let state = self.lock();
        if !state.mapped {
            return Err(Error::NotMapped);
        }
        Ok(state.words[slot])
    }

    fn write_word(&mut self, register: Register, index: usize, value: u32) -> Result<()> {
        let slot = Self::slot(register, index)?;
        let mut state = self.lock();
        if !state.mapped {
            return Err(Error::NotMapped);
        }
        if register == Register::Gpeds {
            state.words[slot] &= !value;
        } else {
            state.words[slot] = value;
        }
        state.journal.push(RegisterWrite {
            register,
            index,
            value,
        });
        Ok(())
    }
}
