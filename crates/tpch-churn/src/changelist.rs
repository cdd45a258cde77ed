//! Single-row mutation descriptors.
//!
//! An update is a primary key ([`RowKey`]) plus a list of column updates
//! ([`RowChangeList`]) addressed by position in the full schema.

use crate::{Result, Schema, Value};

/// Primary key of a `lineitem` row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub order_key: u32,
    pub line_number: u32,
}

impl RowKey {
    pub const fn new(order_key: u32, line_number: u32) -> Self {
        Self {
            order_key,
            line_number,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnUpdate {
    pub column_idx: usize,
    pub value: Value,
}

/// An ordered list of column updates to apply to one row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowChangeList {
    updates: Vec<ColumnUpdate>,
}

impl RowChangeList {
    pub fn updates(&self) -> &[ColumnUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Builds a [`RowChangeList`] against a schema, type-checking each update.
///
/// Key columns cannot be updated.
pub struct RowChangeListEncoder<'a> {
    schema: &'a Schema,
    changes: RowChangeList,
}

impl<'a> RowChangeListEncoder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            changes: RowChangeList::default(),
        }
    }

    /// Appends an update of column `column_idx` to `value`.
    ///
    /// # Errors
    /// Fails if the column does not exist, is a key column, or has a
    /// different type than `value`.
    pub fn add_column_update(&mut self, column_idx: usize, value: Value) -> Result<()> {
        self.schema.check_value(column_idx, &value)?;
        if column_idx < self.schema.num_key_columns() {
            return Err(crate::Error::ColumnOutOfRange {
                column: format!("{} (key column)", self.schema.column(column_idx)?.name()),
            });
        }
        self.changes.updates.push(ColumnUpdate { column_idx, value });
        Ok(())
    }

    pub fn finish(self) -> RowChangeList {
        self.changes
    }
}
