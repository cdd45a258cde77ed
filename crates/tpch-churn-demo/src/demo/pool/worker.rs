use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tpch_churn::{
    Inserter, LineImporter, LineItemDao, Result, Updater, WindowCursor, WorkloadStats,
    demo_query_schema, line_item_schema,
};

/// What a worker reports when it returns without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerReport {
    /// An updater observed cancellation.
    Updater,
    /// The inserter ran out of input or was cancelled after `rows` writes.
    Inserter { rows: u64 },
}

/// The value every pool task resolves to.
#[derive(Debug)]
pub struct WorkerExit {
    pub name: String,
    pub result: Result<WorkerReport>,
}

/// Body of an updater task. Blocks until `cancel` fires or the DAO fails.
pub fn updater_loop<D>(
    dao: D,
    cursor: Arc<WindowCursor>,
    stats: Arc<WorkloadStats>,
    cancel: &CancellationToken,
) -> Result<WorkerReport>
where
    D: LineItemDao,
{
    tracing::trace!("updater started");
    let updater = Updater::new(dao, cursor, line_item_schema(), demo_query_schema(), stats)?;
    updater.run(cancel)?;
    Ok(WorkerReport::Updater)
}

/// Body of the inserter task.
///
/// The importer is opened here rather than by the caller so that file I/O
/// stays off the async runtime.
pub fn inserter_loop<D, I, O>(
    dao: D,
    open: O,
    cursor: Arc<WindowCursor>,
    stats: Arc<WorkloadStats>,
    cancel: &CancellationToken,
) -> Result<WorkerReport>
where
    D: LineItemDao,
    I: LineImporter,
    O: FnOnce() -> Result<I>,
{
    tracing::trace!("inserter started");
    let importer = open()?;
    let inserter = Inserter::new(dao, importer, cursor, line_item_schema(), stats)?;
    let rows = inserter.run(cancel)?;
    Ok(WorkerReport::Inserter { rows })
}
