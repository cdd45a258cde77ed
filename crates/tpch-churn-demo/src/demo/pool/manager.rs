//! Supervision of the updater and inserter tasks.
//!
//! Every worker runs its blocking loop on tokio's blocking pool and shares a
//! single [`CancellationToken`] with the [`WorkerPool`]. The pool fails fast:
//! the first worker error ends [`WorkerPool::supervise`], after which the
//! caller is expected to run [`WorkerPool::shutdown`].

use super::worker::{WorkerExit, WorkerReport, inserter_loop, updater_loop};
use anyhow::Context;
use core::time::Duration;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tpch_churn::{LineImporter, LineItemDao, Result, StatsSnapshot, WindowCursor, WorkloadStats};

/// Owns the running workers and the token that stops them.
pub struct WorkerPool {
    tasks: JoinSet<WorkerExit>,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
    updaters: usize,
    inserters: usize,
}

impl WorkerPool {
    pub fn new(shutdown_token: CancellationToken, shutdown_timeout: Duration) -> Self {
        Self {
            tasks: JoinSet::new(),
            shutdown_token,
            shutdown_timeout,
            updaters: 0,
            inserters: 0,
        }
    }

    /// Number of workers that have not been reaped yet.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Starts an updater named `updater-N` on its own DAO.
    pub fn spawn_updater<D>(
        &mut self,
        dao: D,
        cursor: &Arc<WindowCursor>,
        stats: &Arc<WorkloadStats>,
    ) where
        D: LineItemDao + 'static,
    {
        let name = format!("updater-{}", self.updaters);
        self.updaters += 1;

        let cursor = Arc::clone(cursor);
        let stats = Arc::clone(stats);
        let cancel = self.shutdown_token.clone();
        self.tasks.spawn_blocking(move || {
            let _span = tracing::info_span!("worker", name = %name).entered();
            let result = updater_loop(dao, cursor, stats, &cancel);
            WorkerExit { name, result }
        });
    }

    /// Starts an inserter named `inserter-N`. `open` runs on the worker
    /// thread and produces the importer.
    pub fn spawn_inserter<D, I, O>(
        &mut self,
        dao: D,
        open: O,
        cursor: &Arc<WindowCursor>,
        stats: &Arc<WorkloadStats>,
    ) where
        D: LineItemDao + 'static,
        I: LineImporter + 'static,
        O: FnOnce() -> Result<I> + Send + 'static,
    {
        let name = format!("inserter-{}", self.inserters);
        self.inserters += 1;

        let cursor = Arc::clone(cursor);
        let stats = Arc::clone(stats);
        let cancel = self.shutdown_token.clone();
        self.tasks.spawn_blocking(move || {
            let _span = tracing::info_span!("worker", name = %name).entered();
            let result = inserter_loop(dao, open, cursor, stats, &cancel);
            WorkerExit { name, result }
        });
    }

    /// Waits until `shutdown` resolves or one worker fails.
    ///
    /// Workers that return cleanly are reaped and logged. Once none are left
    /// the pool idles until `shutdown`. A progress line is logged every
    /// `report_interval`, if set.
    ///
    /// # Errors
    /// Returns the first worker error, or a panic surfaced as a join error.
    /// The remaining workers are still running at that point.
    pub async fn supervise<S>(
        &mut self,
        shutdown: S,
        stats: &WorkloadStats,
        cursor: &WindowCursor,
        report_interval: Option<Duration>,
    ) -> anyhow::Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = report_interval.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let mut previous = stats.snapshot();

        if self.tasks.is_empty() {
            tracing::info!("No workers to run, waiting for shutdown signal");
        }

        loop {
            tokio::select! {
                () = &mut shutdown => return Ok(()),
                joined = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    let Some(joined) = joined else { continue };
                    let exit = joined.context("worker panicked")?;
                    log_exit(&exit);
                    let WorkerExit { name, result } = exit;
                    result.with_context(|| format!("worker {name} failed"))?;
                    if self.tasks.is_empty() {
                        tracing::info!("All workers finished, waiting for shutdown signal");
                    }
                }
                () = tick(&mut ticker) => {
                    previous = report(stats, cursor, previous);
                }
            }
        }
    }

    /// Cancels every worker and waits up to the configured timeout for them
    /// to return.
    ///
    /// Workers still blocked in the store when the timeout expires are left
    /// behind.
    pub async fn shutdown(&mut self) {
        tracing::info!(workers = self.tasks.len(), "Stopping workers");
        self.shutdown_token.cancel();

        let tasks = &mut self.tasks;
        let drained = timeout(self.shutdown_timeout, async move {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(exit) => log_exit(&exit),
                    Err(e) => tracing::error!("Worker panicked: {e}"),
                }
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::info!("Worker pool shutdown complete"),
            Err(_) => {
                tracing::warn!(
                    remaining = self.tasks.len(),
                    "Worker shutdown timed out after {:?}",
                    self.shutdown_timeout
                );
                self.tasks.detach_all();
            }
        }
    }
}

fn log_exit(exit: &WorkerExit) {
    match &exit.result {
        Ok(WorkerReport::Updater) => tracing::info!(worker = %exit.name, "Worker stopped"),
        Ok(WorkerReport::Inserter { rows }) => {
            tracing::info!(worker = %exit.name, rows, "Worker stopped");
        }
        Err(e) => tracing::error!(worker = %exit.name, "Worker failed: {e}"),
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => core::future::pending().await,
    }
}

fn report(stats: &WorkloadStats, cursor: &WindowCursor, previous: StatsSnapshot) -> StatsSnapshot {
    let current = stats.snapshot();
    let delta = current.since(&previous);
    tracing::info!(
        updates = delta.updates,
        empty_scans = delta.empty_scans,
        inserts = delta.inserts,
        total_updates = current.updates,
        total_inserts = current.inserts,
        cursor = cursor.load(),
        "Progress"
    );
    current
}
