use crate::{ColumnSchema, Value};

/// Inclusive range predicate over a single column.
///
/// Missing bounds are open. An equality lookup sets both bounds to the same
/// value.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnRangePredicate {
    column: ColumnSchema,
    lower_bound: Option<Value>,
    upper_bound: Option<Value>,
}

impl ColumnRangePredicate {
    pub const fn new(
        column: ColumnSchema,
        lower_bound: Option<Value>,
        upper_bound: Option<Value>,
    ) -> Self {
        Self {
            column,
            lower_bound,
            upper_bound,
        }
    }

    /// `lower_bound == upper_bound == value`.
    pub fn equal(column: ColumnSchema, value: Value) -> Self {
        Self::new(column, Some(value.clone()), Some(value))
    }

    pub const fn column(&self) -> &ColumnSchema {
        &self.column
    }

    pub const fn lower_bound(&self) -> Option<&Value> {
        self.lower_bound.as_ref()
    }

    pub const fn upper_bound(&self) -> Option<&Value> {
        self.upper_bound.as_ref()
    }

    /// Returns `true` if `value` falls inside both bounds.
    pub fn matches(&self, value: &Value) -> bool {
        let above = self.lower_bound.as_ref().is_none_or(|lo| value >= lo);
        let below = self.upper_bound.as_ref().is_none_or(|hi| value <= hi);
        above && below
    }
}
