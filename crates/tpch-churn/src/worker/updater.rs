use crate::{
    ColumnRangePredicate, DemoQueryRow, LineItemDao, ProjectedRow, RandSource, Result,
    RowChangeListEncoder, RowKey, Schema, ThreadRandom, Value, WindowCursor, WorkloadStats,
    column,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of a single [`Updater::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The last line of `order_key` had its quantity bumped.
    Updated {
        order_key: u32,
        line_number: u32,
        old_quantity: u32,
        new_quantity: u32,
    },
    /// The sampled order has no rows (yet). Nothing was mutated.
    NoRows { order: i64 },
}

/// Read-modify-write worker over the trailing window.
///
/// Each iteration samples an order key, scans its lines through the
/// `demo_query_schema` projection, and increments `l_quantity` of the last
/// line returned. The store returns the lines of an order by ascending line
/// number, so that is the highest line of the order.
pub struct Updater<D, R = ThreadRandom>
where
    D: LineItemDao,
    R: RandSource,
{
    dao: D,
    cursor: Arc<WindowCursor<R>>,
    full_schema: Schema,
    query_schema: Schema,
    stats: Arc<WorkloadStats>,
    rows: Vec<ProjectedRow>,
}

impl<D, R> Updater<D, R>
where
    D: LineItemDao,
    R: RandSource,
{
    /// Initialises `dao` and builds an updater around it.
    ///
    /// # Errors
    /// Propagates any error from [`LineItemDao::init`].
    pub fn new(
        mut dao: D,
        cursor: Arc<WindowCursor<R>>,
        full_schema: Schema,
        query_schema: Schema,
        stats: Arc<WorkloadStats>,
    ) -> Result<Self> {
        dao.init()?;
        Ok(Self {
            dao,
            cursor,
            full_schema,
            query_schema,
            stats,
            rows: Vec::new(),
        })
    }

    /// Runs one read-modify-write iteration.
    ///
    /// # Errors
    /// Any scanner or mutation error from the DAO is returned as-is.
    pub fn step(&mut self) -> Result<UpdateOutcome> {
        let order = self.cursor.sample();
        tracing::trace!(order, "current order");

        // Keys below zero or past u32::MAX cannot exist in the tablet.
        let Ok(order_key) = u32::try_from(order) else {
            self.stats.record_empty_scan();
            return Ok(UpdateOutcome::NoRows { order });
        };

        let predicate = ColumnRangePredicate::equal(
            self.query_schema.column(0)?.clone(),
            Value::UInt32(order_key),
        );
        self.dao.open_scanner(&self.query_schema, predicate)?;
        self.rows.clear();
        while self.dao.has_more() {
            self.dao.get_next(&mut self.rows)?;
        }

        let Some(last) = self.rows.last() else {
            self.stats.record_empty_scan();
            return Ok(UpdateOutcome::NoRows { order });
        };
        let DemoQueryRow {
            order_key,
            line_number,
            quantity,
        } = DemoQueryRow::try_from(last)?;
        let new_quantity = quantity.wrapping_add(1);

        tracing::debug!(order_key, line_number, quantity, new_quantity, "updating");
        let mut encoder = RowChangeListEncoder::new(&self.full_schema);
        encoder.add_column_update(column::QUANTITY, Value::UInt32(new_quantity))?;
        self.dao
            .mutate_line(RowKey::new(order_key, line_number), encoder.finish())?;
        self.stats.record_update();

        Ok(UpdateOutcome::Updated {
            order_key,
            line_number,
            old_quantity: quantity,
            new_quantity,
        })
    }

    /// Repeats [`Self::step`] until `cancel` fires.
    ///
    /// There is no backoff between iterations: an empty scan is followed
    /// immediately by a new sample.
    ///
    /// # Errors
    /// Stops at, and returns, the first DAO error.
    pub fn run(mut self, cancel: &CancellationToken) -> Result<()> {
        while !cancel.is_cancelled() {
            self.step()?;
        }
        Ok(())
    }
}
