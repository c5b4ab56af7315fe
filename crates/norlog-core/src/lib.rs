//! norlog-core - Append-style byte store over SPI NOR flash
//!
//! This crate turns a sector-erasable NOR flash chip (accessed over a
//! chip-select-gated serial bus) into an append-style byte store with a
//! crash-recoverable write cursor. It is designed to be `no_std`
//! compatible for use in embedded environments.
//!
//! The write cursor is never stored on the chip. After a restart it is
//! reconstructed by scanning for the boundary between written bytes and
//! the erased (`0xFF`) tail, so writing can resume exactly where it
//! stopped when power was lost.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation (boxed device trait objects)
//!
//! # Example
//!
//! ```ignore
//! use norlog_core::{Store, winbond::W25q};
//!
//! fn append_record<B: norlog_core::spi::SpiBus>(bus: B) -> norlog_core::Result<()> {
//!     let mut store = Store::new(W25q::new(bus, 8));
//!     store.init()?;
//!     store.write_data(b"hello")?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod device;
pub mod dump;
pub mod error;
pub mod spi;
pub mod store;
pub mod winbond;

pub use device::{FlashDevice, ERASED, SECTOR_SIZE};
pub use error::{Error, Result};
pub use store::Store;
