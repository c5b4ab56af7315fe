//! SPI types, command framing and the bus transport contract
//!
//! This module provides types for representing SPI transactions, the
//! standard opcodes the driver uses, and the `SpiBus` trait that bus
//! transport implementations plug into.

mod bus;
mod command;
pub mod opcodes;

pub use bus::{run_command, SpiBus};
pub use command::SpiCommand;
pub use opcodes::*;
