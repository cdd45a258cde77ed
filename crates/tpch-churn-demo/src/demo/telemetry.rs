//! Console logging for the demo binary.
//!
//! Everything goes through `tracing`. The filter is read from `RUST_LOG` and
//! falls back to `info`, which prints startup, progress reports and shutdown.
//! Per-update events are at `debug`, per-insert events at `trace`:
//!
//! ```bash
//! RUST_LOG=tpch_churn=debug,info tpch-churn-demo --tpch-demo-inserter-threads 1
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// # Errors
/// Fails if a global subscriber was already set.
pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;
    Ok(())
}
