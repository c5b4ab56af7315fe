//! SPI flash command opcodes
//!
//! The subset of the standard JEDEC SPI flash command set that the
//! W25Q-series driver uses. Values are fixed by the chip protocol and
//! must not change.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required immediately before any write/erase operation
pub const WREN: u8 = 0x06;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data (3-byte address)
pub const READ: u8 = 0x03;
/// Page/byte Program (3-byte address)
pub const PP: u8 = 0x02;

// ============================================================================
// Erase
// ============================================================================

/// Sector Erase 4KB (3-byte address)
pub const SE_20: u8 = 0x20;
/// Chip Erase (entire chip)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Status and identification
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Electronic Manufacturer & Device ID (legacy)
pub const REMS: u8 = 0x90;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Write In Progress / Busy
pub const SR1_WIP: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;
