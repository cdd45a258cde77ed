//! Data-access layer for the `lineitem` table.
//!
//! Workers never talk to a store directly. Each worker owns one
//! [`LineItemDao`] for its whole lifetime and drives it through the
//! sequential scan / mutate / write calls below.
//!
//! ## Structure
//!
//! - [`LineItemDao`] - the contract every store client implements.
//! - [`MemoryLineItemDao`] - an in-process tablet store used by the demo binary and the
//!   tests.

mod memory;

pub use memory::*;

use crate::{ColumnRangePredicate, PartialRow, ProjectedRow, Result, RowChangeList, RowKey, Schema};

/// Client for one `lineitem` tablet.
///
/// Calls block until the store answers. Implementations decide how writes are
/// batched; [`Self::finish_writing`] must flush anything still buffered.
pub trait LineItemDao: Send {
    /// Connects to the store and resolves the tablet.
    fn init(&mut self) -> Result<()>;

    /// Starts a scan of the rows matching `predicate`, projected onto
    /// `projection`. Any previously open scan is discarded.
    fn open_scanner(&mut self, projection: &Schema, predicate: ColumnRangePredicate)
    -> Result<()>;

    /// Returns `true` while the open scan has rows left to fetch.
    fn has_more(&self) -> bool;

    /// Appends the next batch of the open scan to `rows`, in store order.
    fn get_next(&mut self, rows: &mut Vec<ProjectedRow>) -> Result<()>;

    /// Applies `changes` to the row identified by `key`.
    fn mutate_line(&mut self, key: RowKey, changes: RowChangeList) -> Result<()>;

    /// Inserts a fully populated row.
    fn write_line(&mut self, row: &PartialRow) -> Result<()>;

    /// Flushes buffered writes.
    fn finish_writing(&mut self) -> Result<()>;
}

impl<D> LineItemDao for Box<D>
where
    D: LineItemDao + ?Sized,
{
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn open_scanner(
        &mut self,
        projection: &Schema,
        predicate: ColumnRangePredicate,
    ) -> Result<()> {
        (**self).open_scanner(projection, predicate)
    }

    fn has_more(&self) -> bool {
        (**self).has_more()
    }

    fn get_next(&mut self, rows: &mut Vec<ProjectedRow>) -> Result<()> {
        (**self).get_next(rows)
    }

    fn mutate_line(&mut self, key: RowKey, changes: RowChangeList) -> Result<()> {
        (**self).mutate_line(key, changes)
    }

    fn write_line(&mut self, row: &PartialRow) -> Result<()> {
        (**self).write_line(row)
    }

    fn finish_writing(&mut self) -> Result<()> {
        (**self).finish_writing()
    }
}
