//! Flash device capability contract
//!
//! This module provides the `FlashDevice` trait that abstracts over the
//! hardware SPI-NOR driver and the in-memory stand-in, so the storage
//! engine never depends on a concrete variant.

use crate::error::Result;
use crate::spi::opcodes;
use bitflags::bitflags;

/// Value an erased byte reads back as.
///
/// This sentinel is the only signal NOR flash exposes to distinguish
/// "never written" from "written"; there is no other metadata on chip.
pub const ERASED: u8 = 0xFF;

/// Erase granule of NOR flash in bytes (4 KiB sectors)
pub const SECTOR_SIZE: u32 = 4096;

bitflags! {
    /// Status register 1 view
    ///
    /// Transient hardware state reported by the device; never persisted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status1: u8 {
        /// Write/erase operation in progress
        const BUSY = opcodes::SR1_WIP;
        /// Write enable latch is set
        const WEL = opcodes::SR1_WEL;
    }
}

/// Capability contract for a sector-erasable NOR flash device
///
/// Variants: the hardware W25Q-series driver ([`crate::winbond::W25q`])
/// and the in-memory stand-in (`norlog-dummy`). The storage engine is
/// generic over this trait.
///
/// # Erase-before-write
///
/// Programming is only well-defined at addresses that currently read as
/// [`ERASED`]. NOR hardware can only clear bits (1 -> 0); writing over
/// non-erased bytes is a caller obligation violation and is not checked
/// at runtime, mirroring the real chip.
pub trait FlashDevice {
    /// Total flash size in bytes, fixed at construction
    fn capacity(&self) -> u32;

    /// Read exactly `buf.len()` bytes starting at `address`.
    ///
    /// Never blocks on a busy device - it is the caller's responsibility
    /// not to read mid-erase or mid-program.
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - if the read extends beyond the capacity
    fn read_data(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Program `data` starting at `address`.
    ///
    /// The target region must be erased (all bytes [`ERASED`]).
    ///
    /// # Errors
    /// * `CapacityExceeded` - if the write extends beyond the capacity;
    ///   nothing is written in that case
    fn write_data(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Read the six chip identification bytes.
    ///
    /// The contents are opaque at this layer; the storage engine only
    /// logs them for diagnostics.
    fn read_chip_info(&mut self) -> Result<[u8; 6]>;

    /// Erase the whole chip to [`ERASED`].
    ///
    /// Blocking: does not return until the device reports not-busy, or
    /// the poll bound is exceeded (`Timeout`).
    fn erase_chip(&mut self) -> Result<()>;

    /// Erase the 4 KiB sector `sector` (bytes `sector * 4096 ..
    /// sector * 4096 + 4096`) to [`ERASED`].
    ///
    /// Same blocking contract as [`FlashDevice::erase_chip`].
    fn erase_sector(&mut self, sector: u32) -> Result<()>;

    /// Read status register 1
    fn read_status1(&mut self) -> Result<u8>;

    /// Read status register 2
    fn read_status2(&mut self) -> Result<u8>;

    /// Read the write status register.
    ///
    /// Known-incomplete protocol step: implementations are permitted to
    /// return a fixed placeholder where the underlying read is not
    /// implemented.
    fn read_write_status(&mut self) -> Result<u16>;

    /// Whether a write/erase operation is in progress (SR1 bit 0)
    fn is_busy(&mut self) -> Result<bool> {
        let status = Status1::from_bits_truncate(self.read_status1()?);
        Ok(status.contains(Status1::BUSY))
    }

    /// Check if a range is valid for this device
    fn is_valid_range(&self, address: u32, len: usize) -> bool {
        // u64 arithmetic avoids overflow near the 24-bit address ceiling
        let end = address as u64 + len as u64;
        end <= self.capacity() as u64
    }
}

// Forwarding impl so boxed devices can be used as trait objects
#[cfg(feature = "alloc")]
impl FlashDevice for alloc::boxed::Box<dyn FlashDevice + Send> {
    fn capacity(&self) -> u32 {
        (**self).capacity()
    }

    fn read_data(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_data(address, buf)
    }

    fn write_data(&mut self, address: u32, data: &[u8]) -> Result<()> {
        (**self).write_data(address, data)
    }

    fn read_chip_info(&mut self) -> Result<[u8; 6]> {
        (**self).read_chip_info()
    }

    fn erase_chip(&mut self) -> Result<()> {
        (**self).erase_chip()
    }

    fn erase_sector(&mut self, sector: u32) -> Result<()> {
        (**self).erase_sector(sector)
    }

    fn read_status1(&mut self) -> Result<u8> {
        (**self).read_status1()
    }

    fn read_status2(&mut self) -> Result<u8> {
        (**self).read_status2()
    }

    fn read_write_status(&mut self) -> Result<u16> {
        (**self).read_write_status()
    }

    fn is_busy(&mut self) -> Result<bool> {
        (**self).is_busy()
    }
}
