//! Column and row descriptors for the TPC-H `lineitem` table.
//!
//! The store addresses columns by position. This module keeps the positional
//! contract in one place ([`column`]) and gives the workers a named view of
//! the only projection they read ([`DemoQueryRow`]).

use crate::{Error, Result};
use std::sync::Arc;

/// Column positions inside [`line_item_schema`].
pub mod column {
    pub const ORDER_KEY: usize = 0;
    pub const LINE_NUMBER: usize = 1;
    pub const SUPP_KEY: usize = 2;
    pub const PART_KEY: usize = 3;
    pub const QUANTITY: usize = 4;
    pub const EXTENDED_PRICE: usize = 5;
    pub const DISCOUNT: usize = 6;
    pub const TAX: usize = 7;
    pub const RETURN_FLAG: usize = 8;
    pub const LINE_STATUS: usize = 9;
    pub const SHIP_DATE: usize = 10;
    pub const COMMIT_DATE: usize = 11;
    pub const RECEIPT_DATE: usize = 12;
    pub const SHIP_INSTRUCT: usize = 13;
    pub const SHIP_MODE: usize = 14;
    pub const COMMENT: usize = 15;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt32,
    Double,
    String,
}

/// A single typed cell.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum Value {
    UInt32(u32),
    Double(f64),
    String(String),
}

impl Value {
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::UInt32(_) => DataType::UInt32,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    name: String,
    data_type: DataType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// An ordered list of columns, the first `num_key_columns` of which form the
/// primary key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
    num_key_columns: usize,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSchema>, num_key_columns: usize) -> Self {
        debug_assert!(num_key_columns <= columns.len());
        Self {
            columns,
            num_key_columns,
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub const fn num_key_columns(&self) -> usize {
        self.num_key_columns
    }

    /// # Errors
    /// Returns [`Error::ColumnOutOfRange`] if `idx` is past the last column.
    pub fn column(&self, idx: usize) -> Result<&ColumnSchema> {
        self.columns.get(idx).ok_or_else(|| Error::ColumnOutOfRange {
            column: idx.to_string(),
        })
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Checks that rows laid out by `other` can be stored under this schema:
    /// same column names, same types, same order.
    pub(crate) fn check_layout(&self, other: &Self) -> Result<()> {
        for (idx, column) in other.columns.iter().enumerate() {
            let Some(expected) = self.columns.get(idx).filter(|c| c.name == column.name) else {
                return Err(Error::ColumnOutOfRange {
                    column: column.name.clone(),
                });
            };
            if expected.data_type != column.data_type {
                return Err(Error::SchemaMismatch {
                    column: column.name.clone(),
                    expected: expected.data_type,
                    actual: column.data_type,
                });
            }
        }
        if let Some(missing) = self.columns.get(other.columns.len()) {
            return Err(Error::IncompleteRow {
                column: missing.name.clone(),
            });
        }
        Ok(())
    }

    /// Checks that `value` can be stored in column `idx`.
    pub(crate) fn check_value(&self, idx: usize, value: &Value) -> Result<()> {
        let column = self.column(idx)?;
        if column.data_type != value.data_type() {
            return Err(Error::SchemaMismatch {
                column: column.name.clone(),
                expected: column.data_type,
                actual: value.data_type(),
            });
        }
        Ok(())
    }
}

/// The full `lineitem` schema. `l_quantity` sits at [`column::QUANTITY`].
pub fn line_item_schema() -> Schema {
    use DataType::{Double, UInt32};
    let text = DataType::String;

    Schema::new(
        vec![
            ColumnSchema::new("l_orderkey", UInt32),
            ColumnSchema::new("l_linenumber", UInt32),
            ColumnSchema::new("l_suppkey", UInt32),
            ColumnSchema::new("l_partkey", UInt32),
            ColumnSchema::new("l_quantity", UInt32),
            ColumnSchema::new("l_extendedprice", Double),
            ColumnSchema::new("l_discount", Double),
            ColumnSchema::new("l_tax", Double),
            ColumnSchema::new("l_returnflag", text),
            ColumnSchema::new("l_linestatus", text),
            ColumnSchema::new("l_shipdate", text),
            ColumnSchema::new("l_commitdate", text),
            ColumnSchema::new("l_receiptdate", text),
            ColumnSchema::new("l_shipinstruct", text),
            ColumnSchema::new("l_shipmode", text),
            ColumnSchema::new("l_comment", text),
        ],
        2,
    )
}

/// The three-column projection read by updaters: order key, line number,
/// quantity, in that order.
pub fn demo_query_schema() -> Schema {
    Schema::new(
        vec![
            ColumnSchema::new("l_orderkey", DataType::UInt32),
            ColumnSchema::new("l_linenumber", DataType::UInt32),
            ColumnSchema::new("l_quantity", DataType::UInt32),
        ],
        2,
    )
}

/// A mutable row buffer over a schema, filled column by column.
#[derive(Clone, Debug)]
pub struct PartialRow {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl PartialRow {
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![None; schema.num_columns()];
        Self { schema, values }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// # Errors
    /// Fails if `idx` is out of range or the value's type does not match the
    /// column.
    pub fn set(&mut self, idx: usize, value: Value) -> Result<()> {
        self.schema.check_value(idx, &value)?;
        self.values[idx] = Some(value);
        Ok(())
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx).and_then(Option::as_ref)
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = None);
    }

    /// Returns every value, failing on the first unset column.
    pub fn to_values(&self) -> Result<Vec<Value>> {
        self.values
            .iter()
            .zip(self.schema.columns())
            .map(|(value, column)| {
                value.clone().ok_or_else(|| Error::IncompleteRow {
                    column: column.name().to_string(),
                })
            })
            .collect()
    }
}

/// A row as returned by a scan: values in projection order.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedRow(Vec<Value>);

impl ProjectedRow {
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    fn u32_at(&self, idx: usize, name: &str) -> Result<u32> {
        match self.0.get(idx) {
            Some(Value::UInt32(v)) => Ok(*v),
            Some(other) => Err(Error::SchemaMismatch {
                column: name.to_string(),
                expected: DataType::UInt32,
                actual: other.data_type(),
            }),
            None => Err(Error::ColumnOutOfRange {
                column: name.to_string(),
            }),
        }
    }
}

/// Named view of a row under [`demo_query_schema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoQueryRow {
    pub order_key: u32,
    pub line_number: u32,
    pub quantity: u32,
}

impl TryFrom<&ProjectedRow> for DemoQueryRow {
    type Error = Error;

    fn try_from(row: &ProjectedRow) -> Result<Self> {
        Ok(Self {
            order_key: row.u32_at(0, "l_orderkey")?,
            line_number: row.u32_at(1, "l_linenumber")?,
            quantity: row.u32_at(2, "l_quantity")?,
        })
    }
}
