//! Wiring for the `tpch-churn-demo` binary.
//!
//! ## Structure
//!
//! - [`config`] - CLI/environment configuration.
//! - [`pool`] - spawning and supervising the workers.
//! - [`telemetry`] - console logging.

pub mod config;
pub mod pool;
pub mod telemetry;
