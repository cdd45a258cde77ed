#![doc = include_str!("../README.md")]

mod changelist;
mod dao;
mod error;
mod importer;
mod predicate;
mod schema;
mod stats;
mod window;
mod worker;

pub use crate::changelist::*;
pub use crate::dao::*;
pub use crate::error::*;
pub use crate::importer::*;
pub use crate::predicate::*;
pub use crate::schema::*;
pub use crate::stats::*;
pub use crate::window::*;
pub use crate::worker::*;
