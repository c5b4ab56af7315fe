//! Storage engine - sequential, crash-recoverable allocation of write
//! addresses on top of any [`FlashDevice`]
//!
//! The engine owns the single write cursor. The cursor is never stored
//! on the chip; it exists only as a derived property of chip contents
//! (the boundary between written bytes and the erased `0xFF` tail) and
//! is re-derived by [`Store::init`] after every restart.

use crate::device::{FlashDevice, ERASED};
use crate::error::{Error, Result};

/// Forward stride of the recovery scan in bytes.
///
/// The scan probes one byte per stride, then walks back byte-wise to
/// land exactly on the first free byte.
pub const SCAN_STRIDE: u32 = 256;

/// Append-style byte store with a crash-recoverable write cursor
///
/// Exclusively owns both the device and the cursor; there is no other
/// writer in scope, so no locking is needed or provided.
pub struct Store<D> {
    device: D,
    write_address: u32,
}

impl<D: FlashDevice> Store<D> {
    /// Wrap a device. The cursor starts at 0 and is only meaningful
    /// after [`Store::init`].
    pub fn new(device: D) -> Self {
        Self {
            device,
            write_address: 0,
        }
    }

    /// Set up the store: find the next free location and point the
    /// write cursor at it.
    ///
    /// Must be called before `write_byte`/`write_data`. Writes issued
    /// before `init` land at address 0 unguarded, exactly like the
    /// hardware would take them.
    pub fn init(&mut self) -> Result<()> {
        let next = self.find_next_write_address()?;
        self.write_address = next;
        Ok(())
    }

    /// Scan the chip and find the next free location to write.
    ///
    /// Probes forward from address 0 in [`SCAN_STRIDE`] steps until an
    /// [`ERASED`] byte turns up (bounded by the capacity), then walks
    /// backward one byte at a time over the erased tail to the first
    /// free byte. The backward walk is skipped when the probe never
    /// left address 0, so it cannot underflow.
    ///
    /// A chip with no free byte legitimately yields the capacity
    /// itself; see [`Store::is_full`].
    pub fn find_next_write_address(&mut self) -> Result<u32> {
        let capacity = self.device.capacity();
        let mut next = 0u32;
        while next < capacity {
            if self.read_byte(next)? == ERASED {
                break;
            }
            next += SCAN_STRIDE;
        }
        if next > capacity {
            next = capacity;
        }
        if next != 0 {
            while next > 0 && self.read_byte(next - 1)? == ERASED {
                next -= 1;
            }
        }
        log::debug!("find_next_write_address: {}", next);
        Ok(next)
    }

    /// Next free address the engine will write to
    pub fn write_address(&self) -> u32 {
        self.write_address
    }

    /// Whether the cursor sits at or past the capacity - no free byte
    /// was found and writes will be refused.
    pub fn is_full(&self) -> bool {
        self.write_address >= self.device.capacity()
    }

    /// Unconditionally override the write cursor.
    ///
    /// Dangerous: subsequent writes will corrupt any non-erased bytes
    /// at that address. No implicit erase is performed.
    pub fn set_write_address(&mut self, address: u32) {
        self.write_address = address;
    }

    /// Read a single byte from the given address
    pub fn read_byte(&mut self, address: u32) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.device.read_data(address, &mut byte)?;
        Ok(byte[0])
    }

    /// Read `buf.len()` bytes starting at `address`
    pub fn read_data(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.device.read_data(address, buf)
    }

    /// Write a single byte at the cursor
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_data(&[byte])
    }

    /// Write `data` at the cursor and advance it by `data.len()`.
    ///
    /// Refused wholesale when the write would run past the capacity:
    /// nothing is written and the cursor does not move.
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        if !self.device.is_valid_range(self.write_address, data.len()) {
            log::warn!(
                "refusing {}-byte write at {}: chip capacity is {}",
                data.len(),
                self.write_address,
                self.device.capacity()
            );
            return Err(Error::CapacityExceeded);
        }
        self.device.write_data(self.write_address, data)?;
        self.write_address += data.len() as u32;
        Ok(())
    }

    /// Erase the whole chip and reset the cursor to 0.
    ///
    /// This is the only erase path that keeps the cursor valid. Raw
    /// erases issued against the device directly invalidate the cursor
    /// and require a fresh [`Store::init`].
    pub fn erase_chip(&mut self) -> Result<()> {
        self.device.erase_chip()?;
        self.write_address = 0;
        Ok(())
    }

    /// Erase one 4 KiB sector, leaving the cursor untouched.
    ///
    /// If the erased range lies at or behind the cursor the cursor is
    /// stale afterwards; re-run [`Store::init`] before writing again.
    pub fn erase_sector(&mut self, sector: u32) -> Result<()> {
        self.device.erase_sector(sector)
    }

    /// Read the six chip identification bytes
    pub fn chip_info(&mut self) -> Result<[u8; 6]> {
        self.device.read_chip_info()
    }

    /// Query the chip and log its identification bytes
    pub fn chip_query(&mut self) -> Result<()> {
        let info = self.chip_info()?;
        log::info!(
            "flash_info: 0x{:02x} 0x{:02x} 0x{:02x} 0x{:02x} 0x{:02x} 0x{:02x}",
            info[0],
            info[1],
            info[2],
            info[3],
            info[4],
            info[5]
        );
        Ok(())
    }

    /// Read status register 1
    pub fn status1(&mut self) -> Result<u8> {
        self.device.read_status1()
    }

    /// Read status register 2
    pub fn status2(&mut self) -> Result<u8> {
        self.device.read_status2()
    }

    /// Borrow the underlying device
    pub fn device(&mut self) -> &mut D {
        &mut self.device
    }

    /// Unwrap the store, giving the device back
    pub fn into_device(self) -> D {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Minimal RAM-backed device for exercising the recovery scan.
    struct RamDevice {
        data: Vec<u8>,
    }

    impl RamDevice {
        fn erased(capacity: usize) -> Self {
            Self {
                data: vec![ERASED; capacity],
            }
        }

        fn with_prefix(capacity: usize, written: usize) -> Self {
            let mut dev = Self::erased(capacity);
            for byte in &mut dev.data[..written] {
                *byte = 0x42;
            }
            dev
        }
    }

    impl FlashDevice for RamDevice {
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
            for (slot, &byte) in self.data[addr..].iter_mut().zip(data) {
                *slot &= byte;
            }
            Ok(())
        }

        fn read_chip_info(&mut self) -> Result<[u8; 6]> {
            Ok([0; 6])
        }

        fn erase_chip(&mut self) -> Result<()> {
            self.data.fill(ERASED);
            Ok(())
        }

        fn erase_sector(&mut self, _sector: u32) -> Result<()> {
            Ok(())
        }

        fn read_status1(&mut self) -> Result<u8> {
            Ok(0)
        }

        fn read_status2(&mut self) -> Result<u8> {
            Ok(0)
        }

        fn read_write_status(&mut self) -> Result<u16> {
            Ok(0)
        }
    }

    #[test]
    fn all_erased_chip_recovers_to_zero() {
        let mut store = Store::new(RamDevice::erased(1024));
        assert_eq!(store.find_next_write_address().unwrap(), 0);
    }

    #[test]
    fn short_prefix_recovers_exact_length() {
        // prefix well inside the first scan stride
        let mut store = Store::new(RamDevice::with_prefix(1024, 3));
        assert_eq!(store.find_next_write_address().unwrap(), 3);
    }

    #[test]
    fn stride_aligned_prefix_recovers_exact_length() {
        let mut store = Store::new(RamDevice::with_prefix(1024, 512));
        assert_eq!(store.find_next_write_address().unwrap(), 512);
    }

    #[test]
    fn prefix_past_last_stride_probe_recovers_exact_length() {
        // 260 written on a 300-byte chip: the forward probe at 256 hits
        // a written byte and the next probe would run off the end
        let mut store = Store::new(RamDevice::with_prefix(300, 260));
        assert_eq!(store.find_next_write_address().unwrap(), 260);
    }

    #[test]
    fn full_chip_recovers_to_capacity() {
        let mut store = Store::new(RamDevice::with_prefix(1024, 1024));
        assert_eq!(store.find_next_write_address().unwrap(), 1024);
        store.init().unwrap();
        assert!(store.is_full());
        assert_eq!(store.write_data(&[0x01]), Err(Error::CapacityExceeded));
    }

    #[test]
    fn cursor_advances_by_written_length() {
        let mut store = Store::new(RamDevice::erased(1024));
        store.init().unwrap();
        store.write_byte(0xA5).unwrap();
        store.write_data(&[1, 2, 3]).unwrap();
        assert_eq!(store.write_address(), 4);
    }

    #[test]
    fn refused_write_leaves_cursor_and_contents_alone() {
        let mut store = Store::new(RamDevice::erased(8));
        store.init().unwrap();
        store.write_data(&[0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(store.write_data(&[6, 7, 8]), Err(Error::CapacityExceeded));
        assert_eq!(store.write_address(), 6);
        assert_eq!(store.read_byte(6).unwrap(), ERASED);
        assert_eq!(store.read_byte(7).unwrap(), ERASED);
    }

    #[test]
    fn engine_erase_resets_cursor() {
        let mut store = Store::new(RamDevice::with_prefix(1024, 100));
        store.init().unwrap();
        assert_eq!(store.write_address(), 100);
        store.erase_chip().unwrap();
        assert_eq!(store.write_address(), 0);
        assert_eq!(store.find_next_write_address().unwrap(), 0);
    }
}
