//! SPI bus transport contract
//!
//! The bus transport is an external collaborator: something that can
//! exchange single bytes over a chip-select-gated serial link. The
//! driver in this crate frames every chip operation as
//! select / opcode / address / data / deselect on top of it.

use crate::error::Result;
use crate::spi::SpiCommand;

/// Ordered byte exchange over a chip-select-gated serial link.
///
/// `transfer` clocks one byte out while clocking one byte in; failures
/// propagate as opaque I/O errors and no recovery is attempted here.
/// Chip-select assertion frames a command sequence - a command is only
/// interpreted by the chip between `select` and `deselect`.
pub trait SpiBus {
    /// Assert chip select (start of a framed command sequence)
    fn select(&mut self);

    /// Deassert chip select (end of a framed command sequence)
    fn deselect(&mut self);

    /// Exchange a single byte on the bus
    fn transfer(&mut self, byte: u8) -> Result<u8>;
}

/// Execute a single SPI command against the bus.
///
/// Frames the command as: assert select, send the 1-byte opcode, send
/// 0-3 address bytes most significant first, send the write data, then
/// exchange the read bytes (clocking out `0x00`), and deassert select.
/// Select is deasserted even when a transfer fails mid-sequence.
pub fn run_command<B: SpiBus + ?Sized>(bus: &mut B, cmd: &mut SpiCommand<'_>) -> Result<()> {
    bus.select();
    let result = exchange(bus, cmd);
    bus.deselect();
    result
}

fn exchange<B: SpiBus + ?Sized>(bus: &mut B, cmd: &mut SpiCommand<'_>) -> Result<()> {
    bus.transfer(cmd.opcode)?;
    if let Some(addr) = cmd.address_bytes() {
        for byte in addr {
            bus.transfer(byte)?;
        }
    }
    for &byte in cmd.write_data {
        bus.transfer(byte)?;
    }
    for slot in cmd.read_buf.iter_mut() {
        *slot = bus.transfer(0x00)?;
    }
    Ok(())
}
