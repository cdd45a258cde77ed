use crate::{
    END_OF_INPUT, LineImporter, LineItemDao, PartialRow, RandSource, Result, Schema, ThreadRandom,
    WindowCursor, WorkloadStats,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of a single [`Inserter::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A row of `order_key` was written and the window now ends there.
    Inserted { order_key: u32 },
    /// The importer ran dry and pending writes were flushed. Terminal.
    Exhausted,
}

/// Streams the import file into the store and drags the window along.
///
/// Only one inserter may advance a given [`WindowCursor`]: the cursor must
/// follow the file order for the window to mean "recently inserted".
pub struct Inserter<D, I, R = ThreadRandom>
where
    D: LineItemDao,
    I: LineImporter,
    R: RandSource,
{
    dao: D,
    importer: I,
    cursor: Arc<WindowCursor<R>>,
    stats: Arc<WorkloadStats>,
    row: PartialRow,
    inserted: u64,
    finished: bool,
}

impl<D, I, R> Inserter<D, I, R>
where
    D: LineItemDao,
    I: LineImporter,
    R: RandSource,
{
    /// Initialises `dao` and builds an inserter writing rows of
    /// `full_schema`.
    ///
    /// # Errors
    /// Propagates any error from [`LineItemDao::init`].
    pub fn new(
        mut dao: D,
        importer: I,
        cursor: Arc<WindowCursor<R>>,
        full_schema: Schema,
        stats: Arc<WorkloadStats>,
    ) -> Result<Self> {
        dao.init()?;
        Ok(Self {
            dao,
            importer,
            cursor,
            stats,
            row: PartialRow::new(Arc::new(full_schema)),
            inserted: 0,
            finished: false,
        })
    }

    pub const fn rows_inserted(&self) -> u64 {
        self.inserted
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Imports and writes one row, or finishes writing at end of input.
    ///
    /// Once [`InsertOutcome::Exhausted`] has been returned, later calls
    /// return it again without touching the importer or the DAO.
    ///
    /// # Errors
    /// Importer and DAO errors are returned as-is.
    pub fn step(&mut self) -> Result<InsertOutcome> {
        if self.finished {
            return Ok(InsertOutcome::Exhausted);
        }

        let order_key = self.importer.get_next_line(&mut self.row)?;
        if order_key == END_OF_INPUT {
            self.finish()?;
            return Ok(InsertOutcome::Exhausted);
        }

        self.dao.write_line(&self.row)?;
        // The write returned; whether the store accepted it is not checked
        // before moving the window.
        self.cursor.advance(i64::from(order_key));
        self.inserted += 1;
        self.stats.record_insert();
        tracing::trace!(order_key, "inserted");

        Ok(InsertOutcome::Inserted { order_key })
    }

    /// Inserts until the importer is exhausted or `cancel` fires, then
    /// flushes. Returns the number of rows written.
    ///
    /// # Errors
    /// Stops at, and returns, the first importer or DAO error.
    pub fn run(mut self, cancel: &CancellationToken) -> Result<u64> {
        while !self.finished {
            if cancel.is_cancelled() {
                tracing::debug!(rows = self.inserted, "inserter cancelled, flushing");
                self.finish()?;
                break;
            }
            self.step()?;
        }
        Ok(self.inserted)
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        self.dao.finish_writing()?;
        tracing::info!(
            rows = self.inserted,
            cursor = self.cursor.load(),
            "inserter finished writing"
        );
        Ok(())
    }
}
