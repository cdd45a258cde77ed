//! Error types for the lineitem churn workload.
//!
//! Everything that can fail in this crate fails inside a collaborator: the
//! data-access layer ([`LineItemDao`]) or the importer ([`LineImporter`]).
//! Workers never handle these errors locally; they propagate them with `?`
//! and stop.
//!
//! [`LineItemDao`]: crate::LineItemDao
//! [`LineImporter`]: crate::LineImporter

use crate::DataType;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the churn workload.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A value did not match the type of the column it was written to.
    #[error("Schema mismatch on column `{column}`: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    /// A column index or name does not exist in the schema.
    #[error("Column {column} is not part of the schema")]
    ColumnOutOfRange { column: String },

    /// A row was submitted for insertion with unset columns.
    #[error("Row is missing a value for column `{column}`")]
    IncompleteRow { column: String },

    /// `has_more`/`get_next` was called without an open scanner.
    #[error("No scanner is open")]
    ScannerNotOpen,

    /// The DAO was used before `init` or against an unknown tablet.
    #[error("Tablet `{tablet_id}` not found on {address}")]
    TabletNotFound { tablet_id: String, address: String },

    /// An insert collided with an existing primary key.
    #[error("Row ({order_key}, {line_number}) already present")]
    AlreadyPresent { order_key: u32, line_number: u32 },

    /// A mutation targeted a row that does not exist.
    #[error("Row ({order_key}, {line_number}) not found")]
    RowNotFound { order_key: u32, line_number: u32 },

    /// A source line could not be mapped onto the lineitem schema.
    #[error("Import error at line {line}: {reason}")]
    Import { line: u64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}
