use crate::{
    ColumnRangePredicate, Error, LineItemDao, PartialRow, ProjectedRow, Result, RowChangeList,
    RowKey, Schema, Value, column, line_item_schema,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

type Tablet = BTreeMap<RowKey, Vec<Value>>;

/// An in-process store holding `lineitem` tablets keyed by
/// `(l_orderkey, l_linenumber)`.
///
/// Cloning is cheap; every clone sees the same tablets. Rows are kept in key
/// order, so scans return the lines of an order by ascending line number.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    address: Arc<str>,
    tablets: Arc<RwLock<HashMap<String, Tablet>>>,
}

impl MemoryStore {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Arc::from(address.into()),
            tablets: Arc::default(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Creates `tablet_id` if it does not exist yet. Returns `true` if it was
    /// created by this call.
    pub fn create_tablet(&self, tablet_id: &str) -> bool {
        let mut tablets = self.tablets.write();
        if tablets.contains_key(tablet_id) {
            return false;
        }
        tablets.insert(tablet_id.to_string(), Tablet::new());
        true
    }

    pub fn row_count(&self, tablet_id: &str) -> usize {
        self.tablets.read().get(tablet_id).map_or(0, BTreeMap::len)
    }

    pub fn get_row(&self, tablet_id: &str, key: RowKey) -> Option<Vec<Value>> {
        self.tablets.read().get(tablet_id)?.get(&key).cloned()
    }

    fn tablet_not_found(&self, tablet_id: &str) -> Error {
        Error::TabletNotFound {
            tablet_id: tablet_id.to_string(),
            address: self.address.to_string(),
        }
    }
}

/// [`LineItemDao`] over a [`MemoryStore`] tablet.
///
/// Inserts are buffered and flushed once `max_batch_size` rows are pending or
/// on [`LineItemDao::finish_writing`]. Mutations are applied immediately.
/// Scans hand out at most `max_batch_size` rows per
/// [`LineItemDao::get_next`] call.
pub struct MemoryLineItemDao {
    store: MemoryStore,
    tablet_id: String,
    max_batch_size: usize,
    schema: Schema,
    initialized: bool,
    pending: Vec<(RowKey, Vec<Value>)>,
    scan: Option<VecDeque<ProjectedRow>>,
}

impl MemoryLineItemDao {
    pub fn new(store: MemoryStore, tablet_id: impl Into<String>, max_batch_size: usize) -> Self {
        Self {
            store,
            tablet_id: tablet_id.into(),
            max_batch_size: max_batch_size.max(1),
            schema: line_item_schema(),
            initialized: false,
            pending: Vec::new(),
            scan: None,
        }
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(self.store.tablet_not_found(&self.tablet_id))
        }
    }

    /// Maps each projected column onto its position in the full schema.
    fn resolve_projection(&self, projection: &Schema) -> Result<Vec<usize>> {
        projection
            .columns()
            .iter()
            .map(|c| {
                let idx = self
                    .schema
                    .find_column(c.name())
                    .ok_or_else(|| Error::ColumnOutOfRange {
                        column: c.name().to_string(),
                    })?;
                let expected = self.schema.column(idx)?.data_type();
                if expected != c.data_type() {
                    return Err(Error::SchemaMismatch {
                        column: c.name().to_string(),
                        expected,
                        actual: c.data_type(),
                    });
                }
                Ok(idx)
            })
            .collect()
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut tablets = self.store.tablets.write();
        let tablet = tablets
            .get_mut(&self.tablet_id)
            .ok_or_else(|| self.store.tablet_not_found(&self.tablet_id))?;

        let mut first_error = None;
        let flushed = self.pending.len();
        for (key, values) in self.pending.drain(..) {
            if tablet.contains_key(&key) {
                first_error.get_or_insert(Error::AlreadyPresent {
                    order_key: key.order_key,
                    line_number: key.line_number,
                });
                continue;
            }
            tablet.insert(key, values);
        }

        tracing::trace!(tablet = %self.tablet_id, rows = flushed, "flushed insert batch");
        first_error.map_or(Ok(()), Err)
    }
}

fn u32_bound(value: Option<&Value>) -> Option<u32> {
    value.and_then(Value::as_u32)
}

fn key_part(values: &[Value], schema: &Schema, idx: usize) -> Result<u32> {
    let column = schema.column(idx)?;
    match values.get(idx) {
        Some(Value::UInt32(v)) => Ok(*v),
        Some(other) => Err(Error::SchemaMismatch {
            column: column.name().to_string(),
            expected: column.data_type(),
            actual: other.data_type(),
        }),
        None => Err(Error::IncompleteRow {
            column: column.name().to_string(),
        }),
    }
}

impl LineItemDao for MemoryLineItemDao {
    fn init(&mut self) -> Result<()> {
        if self.store.create_tablet(&self.tablet_id) {
            tracing::info!(
                address = self.store.address(),
                tablet = %self.tablet_id,
                "created tablet"
            );
        }
        self.initialized = true;
        Ok(())
    }

    fn open_scanner(
        &mut self,
        projection: &Schema,
        predicate: ColumnRangePredicate,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let positions = self.resolve_projection(projection)?;
        let pred_idx = self
            .schema
            .find_column(predicate.column().name())
            .ok_or_else(|| Error::ColumnOutOfRange {
                column: predicate.column().name().to_string(),
            })?;
        let pred_column = self.schema.column(pred_idx)?;
        if pred_column.data_type() != predicate.column().data_type() {
            return Err(Error::SchemaMismatch {
                column: pred_column.name().to_string(),
                expected: pred_column.data_type(),
                actual: predicate.column().data_type(),
            });
        }
        for bound in [predicate.lower_bound(), predicate.upper_bound()]
            .into_iter()
            .flatten()
        {
            self.schema.check_value(pred_idx, bound)?;
        }

        let tablets = self.store.tablets.read();
        let tablet = tablets
            .get(&self.tablet_id)
            .ok_or_else(|| self.store.tablet_not_found(&self.tablet_id))?;

        let project = |values: &Vec<Value>| {
            ProjectedRow::new(positions.iter().map(|&i| values[i].clone()).collect())
        };

        let rows: VecDeque<ProjectedRow> = if pred_idx == column::ORDER_KEY {
            // Key-prefix predicate: walk only the matching key range. Bounds
            // are known to be u32 here; a missing one is open.
            let lo = u32_bound(predicate.lower_bound()).unwrap_or(0);
            let hi = u32_bound(predicate.upper_bound()).unwrap_or(u32::MAX);
            if lo > hi {
                VecDeque::new()
            } else {
                tablet
                    .range(RowKey::new(lo, 0)..=RowKey::new(hi, u32::MAX))
                    .map(|(_, values)| project(values))
                    .collect()
            }
        } else {
            tablet
                .values()
                .filter(|values| predicate.matches(&values[pred_idx]))
                .map(project)
                .collect()
        };

        self.scan = Some(rows);
        Ok(())
    }

    fn has_more(&self) -> bool {
        self.scan.as_ref().is_some_and(|rows| !rows.is_empty())
    }

    fn get_next(&mut self, rows: &mut Vec<ProjectedRow>) -> Result<()> {
        let scan = self.scan.as_mut().ok_or(Error::ScannerNotOpen)?;
        let take = scan.len().min(self.max_batch_size);
        rows.extend(scan.drain(..take));
        Ok(())
    }

    fn mutate_line(&mut self, key: RowKey, changes: RowChangeList) -> Result<()> {
        self.ensure_initialized()?;
        for update in changes.updates() {
            self.schema.check_value(update.column_idx, &update.value)?;
        }

        let mut tablets = self.store.tablets.write();
        let tablet = tablets
            .get_mut(&self.tablet_id)
            .ok_or_else(|| self.store.tablet_not_found(&self.tablet_id))?;
        let row = tablet.get_mut(&key).ok_or(Error::RowNotFound {
            order_key: key.order_key,
            line_number: key.line_number,
        })?;

        for update in changes.updates() {
            row[update.column_idx] = update.value.clone();
        }
        Ok(())
    }

    fn write_line(&mut self, row: &PartialRow) -> Result<()> {
        self.ensure_initialized()?;
        self.schema.check_layout(row.schema())?;
        let values = row.to_values()?;
        let key = RowKey::new(
            key_part(&values, &self.schema, column::ORDER_KEY)?,
            key_part(&values, &self.schema, column::LINE_NUMBER)?,
        );

        self.pending.push((key, values));
        if self.pending.len() >= self.max_batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn finish_writing(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.flush()
    }
}
