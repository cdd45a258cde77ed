//! Sequential row sources for the inserter.

mod tbl;

pub use tbl::*;

use crate::{PartialRow, Result};

/// Order key returned by [`LineImporter::get_next_line`] once the input is
/// exhausted.
pub const END_OF_INPUT: u32 = 0;

/// Reads `lineitem` rows one at a time, in file order.
pub trait LineImporter: Send {
    /// Fills `row` with the next line and returns its order key, or
    /// [`END_OF_INPUT`] when there are no more lines. `row` is left
    /// untouched at end of input.
    fn get_next_line(&mut self, row: &mut PartialRow) -> Result<u32>;
}

impl<I> LineImporter for Box<I>
where
    I: LineImporter + ?Sized,
{
    fn get_next_line(&mut self, row: &mut PartialRow) -> Result<u32> {
        (**self).get_next_line(row)
    }
}
