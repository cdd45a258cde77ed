//! Worker supervision.
//!
//! - [`manager`] - [`manager::WorkerPool`], which owns the worker tasks.
//! - [`worker`] - the blocking bodies run by each task.

pub mod manager;
pub mod worker;
