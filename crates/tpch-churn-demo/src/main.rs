#![doc = include_str!("../README.md")]

mod demo;

use clap::Parser;
use demo::config::{CliArgs, DemoConfig};
use demo::pool::manager::WorkerPool;
use demo::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tpch_churn::{MemoryLineItemDao, MemoryStore, TblImporter, WindowCursor, WorkloadStats};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_telemetry()?;

    let config = DemoConfig::try_from(args).inspect_err(|e| tracing::error!("{e}"))?;
    log_startup_info(&config);

    let store = MemoryStore::new(config.master_address.clone());
    let cursor = Arc::new(WindowCursor::new(config.window, config.starting_point));
    let stats = Arc::new(WorkloadStats::new());
    let mut pool = WorkerPool::new(CancellationToken::new(), config.shutdown_timeout);

    if config.inserter_threads == 1 {
        let path = config.path_to_data.clone();
        pool.spawn_inserter(
            MemoryLineItemDao::new(store.clone(), &config.tablet_id, config.max_batch_size),
            move || TblImporter::from_path(path),
            &cursor,
            &stats,
        );
    }
    for _ in 0..config.updater_threads {
        pool.spawn_updater(
            MemoryLineItemDao::new(store.clone(), &config.tablet_id, config.max_batch_size),
            &cursor,
            &stats,
        );
    }

    let outcome = pool
        .supervise(shutdown_signal(), &stats, &cursor, config.report_interval)
        .await;
    pool.shutdown().await;

    let totals = stats.snapshot();
    tracing::info!(
        updates = totals.updates,
        empty_scans = totals.empty_scans,
        inserts = totals.inserts,
        cursor = cursor.load(),
        rows = store.row_count(&config.tablet_id),
        "Demo finished"
    );
    outcome
}

fn log_startup_info(config: &DemoConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting churn demo with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting churn demo against {} with {} updater(s) and {} inserter(s)",
            config.master_address,
            config.updater_threads,
            config.inserter_threads
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
