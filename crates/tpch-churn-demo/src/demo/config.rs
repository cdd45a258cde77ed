use anyhow::bail;
use clap::Parser;
use core::num::NonZeroU32;
use core::time::Duration;
use std::path::PathBuf;

/// Runtime configuration for the `tpch-churn-demo` binary.
///
/// The defaults assume the initial dataset was loaded from a 6GB `lineitem`
/// file (orders up to 6,000,000) and that the insert file continues from
/// there. All values are parsed from CLI arguments or environment variables.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tpch-churn-demo",
    version,
    about = "Mixed insert/update load over a sliding window of TPC-H lineitem orders"
)]
pub struct CliArgs {
    /// Size of the trailing window, in order numbers.
    ///
    /// Updaters pick orders uniformly from `[cursor - window, cursor)`.
    ///
    /// Environment variable: `TPCH_DEMO_WINDOW`
    #[arg(long, env = "TPCH_DEMO_WINDOW", default_value_t = 3_000_000)]
    pub tpch_demo_window: u32,

    /// Order number the window ends at before anything is inserted.
    ///
    /// Environment variable: `TPCH_DEMO_STARTING_POINT`
    #[arg(
        long,
        env = "TPCH_DEMO_STARTING_POINT",
        default_value_t = 6_000_000,
        allow_negative_numbers = true
    )]
    pub tpch_demo_starting_point: i64,

    /// Number of updater workers. May be 0.
    ///
    /// Environment variable: `TPCH_DEMO_UPDATER_THREADS`
    #[arg(long, env = "TPCH_DEMO_UPDATER_THREADS", default_value_t = 1)]
    pub tpch_demo_updater_threads: usize,

    /// Number of inserter workers: 0 or 1.
    ///
    /// Without an inserter the window never moves.
    ///
    /// Environment variable: `TPCH_DEMO_INSERTER_THREADS`
    #[arg(long, env = "TPCH_DEMO_INSERTER_THREADS", default_value_t = 0)]
    pub tpch_demo_inserter_threads: usize,

    /// Address of the store to operate on.
    ///
    /// Environment variable: `MASTER_ADDRESS`
    #[arg(long, env = "MASTER_ADDRESS", default_value_t = String::from("localhost"))]
    pub master_address: String,

    /// Maximum number of inserts to batch at once, also the scan batch size.
    ///
    /// Environment variable: `TPCH_MAX_BATCH_SIZE`
    #[arg(long, env = "TPCH_MAX_BATCH_SIZE", default_value_t = 1000)]
    pub tpch_max_batch_size: usize,

    /// Path to the `|`-separated dbgen file read by the inserter.
    ///
    /// Environment variable: `TPCH_PATH_TO_DATA`
    #[arg(
        long,
        env = "TPCH_PATH_TO_DATA",
        default_value = "/data/3/dbgen/truncated_lineitem.tbl"
    )]
    pub tpch_path_to_data: PathBuf,

    /// Tablet holding the lineitem rows.
    ///
    /// Environment variable: `TPCH_TABLET_ID`
    #[arg(long, env = "TPCH_TABLET_ID", default_value_t = String::from("tpch1"))]
    pub tablet_id: String,

    /// Seconds between progress reports. 0 disables them.
    ///
    /// Environment variable: `REPORT_INTERVAL_SECS`
    #[arg(long, env = "REPORT_INTERVAL_SECS", default_value_t = 10)]
    pub report_interval_secs: u64,

    /// Seconds to wait for workers to stop after a shutdown signal.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub window: NonZeroU32,
    pub starting_point: i64,
    pub updater_threads: usize,
    pub inserter_threads: usize,
    pub master_address: String,
    pub max_batch_size: usize,
    pub path_to_data: PathBuf,
    pub tablet_id: String,
    pub report_interval: Option<Duration>,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.tpch_demo_inserter_threads > 1 {
            bail!(
                "Can only insert with 1 thread (TPCH_DEMO_INSERTER_THREADS = {})",
                args.tpch_demo_inserter_threads
            );
        }

        let Some(window) = NonZeroU32::new(args.tpch_demo_window) else {
            bail!("TPCH_DEMO_WINDOW must be greater than 0");
        };

        if args
            .tpch_demo_starting_point
            .checked_sub(i64::from(window.get()))
            .is_none()
        {
            bail!(
                "TPCH_DEMO_STARTING_POINT {} is too small for a window of {}",
                args.tpch_demo_starting_point,
                window
            );
        }

        if args.tpch_max_batch_size == 0 {
            bail!("TPCH_MAX_BATCH_SIZE must be greater than 0");
        }

        let report_interval =
            (args.report_interval_secs > 0).then(|| Duration::from_secs(args.report_interval_secs));

        Ok(Self {
            window,
            starting_point: args.tpch_demo_starting_point,
            updater_threads: args.tpch_demo_updater_threads,
            inserter_threads: args.tpch_demo_inserter_threads,
            master_address: args.master_address,
            max_batch_size: args.tpch_max_batch_size,
            path_to_data: args.tpch_path_to_data,
            tablet_id: args.tablet_id,
            report_interval,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        })
    }
}
