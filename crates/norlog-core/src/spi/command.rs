//! SPI command structure

/// A single SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
///
/// Addressed commands use 24-bit (3-byte) addressing, sent most
/// significant byte first. That is the only address width the W25Q-series
/// protocol subset in this crate needs.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// 24-bit address (if any)
    pub address: Option<u32>,

    /// Data to write after opcode/address
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, CE_C7)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a read command with 3-byte address (e.g., READ)
    pub fn read_3b(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write command with 3-byte address (e.g., PP)
    pub fn write_3b(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an erase command with 3-byte address (e.g., SE_20)
    pub fn erase_3b(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Encode the address as 3 bytes, most significant first
    pub fn address_bytes(&self) -> Option<[u8; 3]> {
        self.address
            .map(|addr| [(addr >> 16) as u8, (addr >> 8) as u8, addr as u8])
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this command has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }
}
