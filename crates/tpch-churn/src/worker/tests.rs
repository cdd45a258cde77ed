use crate::{
    ColumnRangePredicate, ColumnUpdate, END_OF_INPUT, Error, InsertOutcome, Inserter, LineImporter,
    LineItemDao, MemoryLineItemDao, MemoryStore, PartialRow, ProjectedRow, RandSource, Result,
    RowChangeList, RowKey, Schema, TblImporter, UpdateOutcome, Updater, Value, WindowCursor,
    WorkloadStats, column, demo_query_schema, line_item_schema,
};
use core::num::NonZeroU32;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Always draws the same offset.
struct FixedRandom(u32);

impl RandSource for FixedRandom {
    fn below(&self, bound: NonZeroU32) -> u32 {
        self.0.min(bound.get() - 1)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Init,
    OpenScanner { order_key: Option<Value> },
    GetNext,
    Mutate { key: RowKey, changes: RowChangeList },
    Write { order_key: u32 },
    FinishWriting,
    GetNextLine,
}

type CallLog = Arc<Mutex<Vec<Call>>>;

/// Scripted DAO: scans return canned rows per order key, two per batch.
#[derive(Default)]
struct MockDao {
    log: CallLog,
    rows_by_order: HashMap<u32, Vec<ProjectedRow>>,
    scan: Vec<ProjectedRow>,
    fail_mutate: bool,
    fail_write: bool,
}

impl MockDao {
    fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            ..Self::default()
        }
    }

    fn with_order(mut self, order_key: u32, lines: &[(u32, u32)]) -> Self {
        let rows = lines
            .iter()
            .map(|&(line_number, quantity)| {
                ProjectedRow::new(vec![
                    Value::UInt32(order_key),
                    Value::UInt32(line_number),
                    Value::UInt32(quantity),
                ])
            })
            .collect();
        self.rows_by_order.insert(order_key, rows);
        self
    }
}

impl LineItemDao for MockDao {
    fn init(&mut self) -> Result<()> {
        self.log.lock().push(Call::Init);
        Ok(())
    }

    fn open_scanner(&mut self, _projection: &Schema, predicate: ColumnRangePredicate) -> Result<()> {
        let order_key = predicate.lower_bound().cloned();
        assert_eq!(predicate.lower_bound(), predicate.upper_bound());
        self.scan = order_key
            .as_ref()
            .and_then(Value::as_u32)
            .and_then(|k| self.rows_by_order.get(&k).cloned())
            .unwrap_or_default();
        self.log.lock().push(Call::OpenScanner { order_key });
        Ok(())
    }

    fn has_more(&self) -> bool {
        !self.scan.is_empty()
    }

    fn get_next(&mut self, rows: &mut Vec<ProjectedRow>) -> Result<()> {
        let take = self.scan.len().min(2);
        rows.extend(self.scan.drain(..take));
        self.log.lock().push(Call::GetNext);
        Ok(())
    }

    fn mutate_line(&mut self, key: RowKey, changes: RowChangeList) -> Result<()> {
        self.log.lock().push(Call::Mutate { key, changes });
        if self.fail_mutate {
            return Err(Error::RowNotFound {
                order_key: key.order_key,
                line_number: key.line_number,
            });
        }
        Ok(())
    }

    fn write_line(&mut self, row: &PartialRow) -> Result<()> {
        let order_key = row
            .get(column::ORDER_KEY)
            .and_then(Value::as_u32)
            .unwrap_or_default();
        self.log.lock().push(Call::Write { order_key });
        if self.fail_write {
            return Err(Error::AlreadyPresent {
                order_key,
                line_number: 1,
            });
        }
        Ok(())
    }

    fn finish_writing(&mut self) -> Result<()> {
        self.log.lock().push(Call::FinishWriting);
        Ok(())
    }
}

/// Hands out the given order keys, then the end-of-input sentinel.
struct MockImporter {
    log: CallLog,
    orders: std::vec::IntoIter<u32>,
}

impl MockImporter {
    fn new(log: &CallLog, orders: Vec<u32>) -> Self {
        Self {
            log: Arc::clone(log),
            orders: orders.into_iter(),
        }
    }
}

impl LineImporter for MockImporter {
    fn get_next_line(&mut self, row: &mut PartialRow) -> Result<u32> {
        self.log.lock().push(Call::GetNextLine);
        match self.orders.next() {
            Some(order_key) => {
                row.set(column::ORDER_KEY, Value::UInt32(order_key))?;
                Ok(order_key)
            }
            None => Ok(END_OF_INPUT),
        }
    }
}

fn window(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

/// A cursor whose every sample is `order`.
fn pinned_cursor(order: i64) -> Arc<WindowCursor<FixedRandom>> {
    Arc::new(WindowCursor::with_rand(window(1), order + 1, FixedRandom(0)))
}

fn updater<D: LineItemDao>(
    dao: D,
    cursor: Arc<WindowCursor<FixedRandom>>,
    stats: &Arc<WorkloadStats>,
) -> Updater<D, FixedRandom> {
    Updater::new(
        dao,
        cursor,
        line_item_schema(),
        demo_query_schema(),
        Arc::clone(stats),
    )
    .unwrap()
}

fn mutations(log: &CallLog) -> Vec<Call> {
    log.lock()
        .iter()
        .filter(|c| matches!(c, Call::Mutate { .. }))
        .cloned()
        .collect()
}

#[test]
fn updater_bumps_quantity_of_highest_line() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let dao = MockDao::new(&log).with_order(777, &[(1, 5), (2, 8), (3, 2)]);
    let mut updater = updater(dao, pinned_cursor(777), &stats);

    let outcome = updater.step().unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            order_key: 777,
            line_number: 3,
            old_quantity: 2,
            new_quantity: 3,
        }
    );

    let calls = log.lock().clone();
    assert_eq!(
        calls,
        vec![
            Call::Init,
            Call::OpenScanner {
                order_key: Some(Value::UInt32(777))
            },
            Call::GetNext,
            Call::GetNext,
            Call::Mutate {
                key: RowKey::new(777, 3),
                changes: {
                    let schema = line_item_schema();
                    let mut encoder = crate::RowChangeListEncoder::new(&schema);
                    encoder
                        .add_column_update(column::QUANTITY, Value::UInt32(3))
                        .unwrap();
                    encoder.finish()
                },
            },
        ]
    );
    assert_eq!(stats.snapshot().updates, 1);
}

#[test]
fn updater_change_list_targets_quantity_column() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let dao = MockDao::new(&log).with_order(5, &[(1, 41)]);
    updater(dao, pinned_cursor(5), &stats).step().unwrap();

    match mutations(&log).as_slice() {
        [Call::Mutate { changes, .. }] => assert_eq!(
            changes.updates(),
            &[ColumnUpdate {
                column_idx: 4,
                value: Value::UInt32(42)
            }]
        ),
        other => panic!("unexpected mutations {other:?}"),
    }
}

#[test]
fn updater_skips_orders_without_rows() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let dao = MockDao::new(&log).with_order(10, &[(1, 1)]);
    let mut updater = updater(dao, pinned_cursor(11), &stats);

    assert_eq!(updater.step().unwrap(), UpdateOutcome::NoRows { order: 11 });
    assert_eq!(updater.step().unwrap(), UpdateOutcome::NoRows { order: 11 });

    let scans = log
        .lock()
        .iter()
        .filter(|c| matches!(c, Call::OpenScanner { .. }))
        .count();
    assert_eq!(scans, 2);
    assert!(mutations(&log).is_empty());
    assert_eq!(stats.snapshot().empty_scans, 2);
}

#[test]
fn updater_does_not_scan_negative_orders() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let cursor = Arc::new(WindowCursor::with_rand(window(100), 50, FixedRandom(0)));
    let mut updater = updater(MockDao::new(&log), cursor, &stats);

    assert_eq!(updater.step().unwrap(), UpdateOutcome::NoRows { order: -50 });
    assert_eq!(log.lock().clone(), vec![Call::Init]);
}

#[test]
fn updater_wraps_quantity_at_type_limit() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let dao = MockDao::new(&log).with_order(3, &[(1, u32::MAX)]);
    let outcome = updater(dao, pinned_cursor(3), &stats).step().unwrap();
    assert!(matches!(
        outcome,
        UpdateOutcome::Updated {
            new_quantity: 0,
            ..
        }
    ));
}

#[test]
fn updater_run_stops_on_dao_error() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let mut dao = MockDao::new(&log).with_order(8, &[(1, 1)]);
    dao.fail_mutate = true;
    let updater = updater(dao, pinned_cursor(8), &stats);

    let err = updater.run(&CancellationToken::new()).unwrap_err();
    assert!(matches!(err, Error::RowNotFound { order_key: 8, .. }));
    assert_eq!(mutations(&log).len(), 1);
}

#[test]
fn updater_run_returns_when_cancelled() {
    let log = CallLog::default();
    let stats = Arc::new(WorkloadStats::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    updater(MockDao::new(&log), pinned_cursor(1), &stats)
        .run(&cancel)
        .unwrap();
    assert_eq!(log.lock().clone(), vec![Call::Init]);
}

fn inserter(
    log: &CallLog,
    orders: Vec<u32>,
    cursor: &Arc<WindowCursor<FixedRandom>>,
) -> Inserter<MockDao, MockImporter, FixedRandom> {
    Inserter::new(
        MockDao::new(log),
        MockImporter::new(log, orders),
        Arc::clone(cursor),
        line_item_schema(),
        Arc::new(WorkloadStats::new()),
    )
    .unwrap()
}

#[test]
fn inserter_finishes_exactly_once_after_last_row() {
    let log = CallLog::default();
    let cursor = Arc::new(WindowCursor::with_rand(window(10), 0, FixedRandom(0)));
    let mut inserter = inserter(&log, vec![1, 1, 2], &cursor);

    assert_eq!(
        inserter.step().unwrap(),
        InsertOutcome::Inserted { order_key: 1 }
    );
    assert_eq!(
        inserter.step().unwrap(),
        InsertOutcome::Inserted { order_key: 1 }
    );
    assert_eq!(
        inserter.step().unwrap(),
        InsertOutcome::Inserted { order_key: 2 }
    );
    assert_eq!(inserter.step().unwrap(), InsertOutcome::Exhausted);
    assert_eq!(inserter.step().unwrap(), InsertOutcome::Exhausted);
    assert!(inserter.is_finished());
    assert_eq!(inserter.rows_inserted(), 3);

    assert_eq!(
        log.lock().clone(),
        vec![
            Call::Init,
            Call::GetNextLine,
            Call::Write { order_key: 1 },
            Call::GetNextLine,
            Call::Write { order_key: 1 },
            Call::GetNextLine,
            Call::Write { order_key: 2 },
            Call::GetNextLine,
            Call::FinishWriting,
        ]
    );
}

#[test]
fn inserter_advances_window_after_each_write() {
    let log = CallLog::default();
    let cursor = Arc::new(WindowCursor::with_rand(window(10), 100, FixedRandom(0)));
    let mut inserter = inserter(&log, vec![101, 105, 230], &cursor);

    inserter.step().unwrap();
    assert_eq!(cursor.load(), 101);
    inserter.step().unwrap();
    assert_eq!(cursor.load(), 105);
    inserter.step().unwrap();
    assert_eq!(cursor.load(), 230);

    inserter.step().unwrap();
    assert_eq!(cursor.load(), 230);
    assert_eq!(cursor.sample(), 220);
}

#[test]
fn inserter_does_not_advance_when_write_errors() {
    let log = CallLog::default();
    let cursor = Arc::new(WindowCursor::with_rand(window(10), 100, FixedRandom(0)));
    let mut inserter = Inserter::new(
        MockDao {
            fail_write: true,
            ..MockDao::new(&log)
        },
        MockImporter::new(&log, vec![101]),
        Arc::clone(&cursor),
        line_item_schema(),
        Arc::new(WorkloadStats::new()),
    )
    .unwrap();

    assert!(inserter.step().is_err());
    assert_eq!(cursor.load(), 100);
}

#[test]
fn inserter_run_drains_importer() {
    let log = CallLog::default();
    let cursor = Arc::new(WindowCursor::with_rand(window(10), 0, FixedRandom(0)));
    let rows = inserter(&log, vec![3, 4, 5, 6], &cursor)
        .run(&CancellationToken::new())
        .unwrap();

    assert_eq!(rows, 4);
    assert_eq!(cursor.load(), 6);
    let calls = log.lock().clone();
    assert_eq!(calls.last(), Some(&Call::FinishWriting));
    assert_eq!(
        calls.iter().filter(|c| **c == Call::FinishWriting).count(),
        1
    );
    assert_eq!(
        calls.iter().filter(|c| **c == Call::GetNextLine).count(),
        5
    );
}

#[test]
fn inserter_flushes_when_cancelled() {
    let log = CallLog::default();
    let cursor = Arc::new(WindowCursor::with_rand(window(10), 0, FixedRandom(0)));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let rows = inserter(&log, vec![1, 2], &cursor).run(&cancel).unwrap();
    assert_eq!(rows, 0);
    assert_eq!(log.lock().clone(), vec![Call::Init, Call::FinishWriting]);
}

#[test]
fn inserted_rows_become_updatable_through_memory_store() {
    const SAMPLE: &str = "\
1|155190|7706|1|17|21168.23|0.04|0.02|N|O|1996-03-13|1996-02-12|1996-03-22|DELIVER IN PERSON|TRUCK|egular courts above the|
1|67310|7311|2|36|45983.16|0.09|0.06|N|O|1996-04-12|1996-02-28|1996-04-20|TAKE BACK RETURN|MAIL|ly final dependencies: slyly bold |
3|4297|1798|1|45|54058.05|0.06|0.00|R|F|1994-02-02|1994-01-04|1994-02-23|NONE|AIR|ongside of the furiously brave acco|
";
    let store = MemoryStore::new("localhost");
    let stats = Arc::new(WorkloadStats::new());
    // Window of 3 ending at the last inserted order; offset 1 picks order 1.
    let cursor = Arc::new(WindowCursor::with_rand(window(3), 0, FixedRandom(1)));

    let rows = Inserter::new(
        MemoryLineItemDao::new(store.clone(), "tpch1", 2),
        TblImporter::from_reader(Cursor::new(SAMPLE)),
        Arc::clone(&cursor),
        line_item_schema(),
        Arc::clone(&stats),
    )
    .unwrap()
    .run(&CancellationToken::new())
    .unwrap();
    assert_eq!(rows, 3);
    assert_eq!(cursor.load(), 3);
    assert_eq!(store.row_count("tpch1"), 3);

    let mut updater = Updater::new(
        MemoryLineItemDao::new(store.clone(), "tpch1", 2),
        Arc::clone(&cursor),
        line_item_schema(),
        demo_query_schema(),
        Arc::clone(&stats),
    )
    .unwrap();

    assert_eq!(
        updater.step().unwrap(),
        UpdateOutcome::Updated {
            order_key: 1,
            line_number: 2,
            old_quantity: 36,
            new_quantity: 37,
        }
    );
    updater.step().unwrap();

    let row = store.get_row("tpch1", RowKey::new(1, 2)).unwrap();
    assert_eq!(row[column::QUANTITY], Value::UInt32(38));
    let untouched = store.get_row("tpch1", RowKey::new(1, 1)).unwrap();
    assert_eq!(untouched[column::QUANTITY], Value::UInt32(17));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.inserts, 3);
    assert_eq!(snapshot.updates, 2);
}
