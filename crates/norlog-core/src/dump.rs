//! Data-array diagnostics
//!
//! Debug visualization for raw chip contents. Formatting only - nothing
//! here touches a device.

use core::fmt;

/// Displays a 256-byte block as 32 rows of 8 hex values, each row
/// prefixed with its starting offset.
///
/// ```
/// # use norlog_core::dump::DumpBlock;
/// let block = [0xFFu8; 256];
/// let text = format!("{}", DumpBlock(&block));
/// assert!(text.starts_with("  0: ff ff ff ff ff ff ff ff\n"));
/// ```
pub struct DumpBlock<'a>(pub &'a [u8; 256]);

impl fmt::Display for DumpBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..32 {
            let start = row * 8;
            write!(f, "{:3}:", start)?;
            for col in 0..8 {
                write!(f, " {:02x}", self.0[start + col])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
