//! Register bank backed by a shared mapping of the GPIO memory device.

use crate::consts;
use crate::error::{Error, Result};
use crate::registers::{Register, RegisterBank};
use log::{debug, trace};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// One page of GPIO registers mapped from a character device.
///
/// The device is opened read/write with `O_SYNC`, mapped shared, and closed
/// again right after mapping; only the mapping is kept.
#[derive(Debug)]
pub struct MappedRegisters {
    path: PathBuf,
    base_offset: u64,
    map: Option<MmapMut>,
}

impl MappedRegisters {
    pub fn new(path: impl Into<PathBuf>, base_offset: u64) -> Self {
        MappedRegisters {
            path: path.into(),
            base_offset,
            map: None,
        }
    }

    fn page_size() -> usize {
        // SAFETY: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        usize::try_from(size)
            .ok()
            .filter(|&s| s >= consts::regs::SPAN)
            .unwrap_or(4096)
    }

    fn checked_offset(register: Register, index: usize, len: usize) -> Result<usize> {
        let offset = register.byte_offset(index)?;
        if offset + 4 > len {
            return Err(Error::RegisterOutOfBounds {
                register,
                index,
                words: register.words(),
            });
        }
        Ok(offset)
    }
}

impl RegisterBank for MappedRegisters {
    fn map(&mut self) -> Result<()> {
        if self.map.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.path)
            .map_err(|source| Error::DeviceOpen {
                path: self.path.clone(),
                source,
            })?;

        let len = Self::page_size();
        // SAFETY: the mapping covers device memory owned exclusively by this
        // bank; all access goes through bounds-checked volatile word access.
        let map = unsafe {
            MmapOptions::new()
                .offset(self.base_offset)
                .len(len)
                .map_mut(&file)
        }
        .map_err(|source| Error::Mapping {
            path: self.path.clone(),
            offset: self.base_offset,
            source,
        })?;
        if map.len() < consts::regs::SPAN {
            return Err(Error::Mapping {
                path: self.path.clone(),
                offset: self.base_offset,
                source: io::Error::new(io::ErrorKind::InvalidData, "mapping too short"),
            });
        }
        debug!(
            "Mapped {} bytes of GPIO registers from {} at offset 0x{:08X}",
            len,
            self.path.display(),
            self.base_offset
        );
        // `file` is dropped here; the mapping stays valid without the descriptor.
        self.map = Some(map);
        Ok(())
    }

    fn unmap(&mut self) {
        if self.map.take().is_some() {
            debug!("Unmapped GPIO registers from {}", self.path.display());
        }
    }

    fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    fn read_word(&self, register: Register, index: usize) -> Result<u32> {
        let map = self.map.as_ref().ok_or(Error::NotMapped)?;
        let offset = Self::checked_offset(register, index, map.len())?;
        // SAFETY: offset + 4 lies within the mapping and the page-aligned base
        // keeps the word aligned. Volatile because the hardware changes these
        // words behind our back.
        let value = unsafe { map.as_ptr().add(offset).cast::<u32>().read_volatile() };
        Ok(value)
    }

    fn write_word(&mut self, register: Register, index: usize, value: u32) -> Result<()> {
        let len = self.map.as_ref().ok_or(Error::NotMapped)?.len();
        let offset = Self::checked_offset(register, index, len)?;
        let map = self.map.as_mut().ok_or(Error::NotMapped)?;
        trace!("Store {:?}[{}] <- 0x{:08X}", register, index, value);
        // SAFETY: same bounds and alignment argument as read_word; `&mut self`
        // gives exclusive access to the mapping.
        unsafe { map.as_mut_ptr().add(offset).cast::<u32>().write_volatile(value) };
        Ok(())
    }
}
