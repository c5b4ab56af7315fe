//! Error types for norlog-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// SPI bus transfer failed
    BusTransferFailed,
    /// Opcode is not supported by the device
    OpcodeNotSupported,

    // Address/size errors
    /// Read extends beyond the configured chip size
    AddressOutOfBounds,
    /// Write extends beyond the configured chip size
    CapacityExceeded,

    // Engine errors
    /// No free byte left on the chip; the write cursor is at capacity
    ChipFull,

    // Operation errors
    /// Device stayed busy past the poll bound
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusTransferFailed => write!(f, "SPI bus transfer failed"),
            Self::OpcodeNotSupported => write!(f, "opcode not supported by device"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::CapacityExceeded => write!(f, "write exceeds chip capacity"),
            Self::ChipFull => write!(f, "chip full: no free byte left"),
            Self::Timeout => write!(f, "device busy past poll bound"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
