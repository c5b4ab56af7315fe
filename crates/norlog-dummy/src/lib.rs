//! norlog-dummy - In-memory flash stand-in for testing
//!
//! This crate provides a non-hardware implementation of the
//! [`FlashDevice`] contract over an in-process buffer. It's useful for
//! validating the storage engine without a real chip on a bus.
//!
//! Status and identification reads return fixed non-zero constants, so
//! diagnostics can tell the stand-in apart from a real chip.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use norlog_core::error::{Error, Result};
use norlog_core::{FlashDevice, ERASED};

/// Default capacity of the stand-in in bytes
pub const DEFAULT_CAPACITY: usize = 300;

/// Canned status register 1 value
pub const STATUS1: u8 = 0x11;
/// Canned status register 2 value
pub const STATUS2: u8 = 0x22;
/// Canned write status register value
pub const WRITE_STATUS: u16 = 0x33;
/// Canned chip identification bytes
pub const CHIP_INFO: [u8; 6] = [0x99, 0x88, 0x77, 0x66, 0x55, 0x44];

/// In-memory flash stand-in
///
/// The buffer starts out fully erased. Programming follows NOR
/// semantics (bits only go 1 -> 0), chip erase refills the buffer with
/// [`ERASED`], and the device is never busy.
///
/// # Limitation
///
/// [`FlashDevice::erase_sector`] only logs; buffer contents are left
/// untouched. Sector-erase tests against the stand-in can therefore
/// assert that the call was made, but not that contents changed.
#[cfg(feature = "alloc")]
pub struct DummyFlash {
    data: Vec<u8>,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create a stand-in of `capacity` bytes, fully erased
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![ERASED; capacity],
        }
    }

    /// Create a stand-in with the default capacity
    pub fn new_default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Create a stand-in with pre-filled data
    pub fn with_data(capacity: usize, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(capacity);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(feature = "alloc")]
impl FlashDevice for DummyFlash {
    fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    fn read_data(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        let addr = address as usize;
        if addr + buf.len() > self.data.len() {
            return Err(Error::AddressOutOfBounds);
        }
        buf.copy_from_slice(&self.data[addr..addr + buf.len()]);
        Ok(())
    }

    fn write_data(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let addr = address as usize;
        if addr + data.len() > self.data.len() {
            return Err(Error::CapacityExceeded);
        }
        // NOR programming: bits only go 1 -> 0
        for (i, &byte) in data.iter().enumerate() {
            self.data[addr + i] &= byte;
        }
        Ok(())
    }

    fn read_chip_info(&mut self) -> Result<[u8; 6]> {
        Ok(CHIP_INFO)
    }

    fn erase_chip(&mut self) -> Result<()> {
        log::info!("erasing entire flash chip...");
        self.data.fill(ERASED);
        log::info!("done erasing");
        Ok(())
    }

    /// Accepted but leaves contents untouched; see the type-level
    /// limitation note.
    fn erase_sector(&mut self, sector: u32) -> Result<()> {
        log::info!("erasing flash sector {}... (stand-in: contents left untouched)", sector);
        Ok(())
    }

    fn read_status1(&mut self) -> Result<u8> {
        Ok(STATUS1)
    }

    fn read_status2(&mut self) -> Result<u8> {
        Ok(STATUS2)
    }

    fn read_write_status(&mut self) -> Result<u16> {
        Ok(WRITE_STATUS)
    }

    // The canned status byte happens to have the busy bit set; the
    // stand-in itself never blocks.
    fn is_busy(&mut self) -> Result<bool> {
        Ok(false)
    }
}
