//! Integration tests for the executors running over catalog tables

use std::sync::Arc;

use tempfile::TempDir;
use tessera::buffer::BufferPoolManager;
use tessera::catalog::Catalog;
use tessera::common::{TesseraError, Transaction};
use tessera::execution::{
    self, CompOp, Condition, ExecContext, Executor, NestedLoopJoinExecutor, ProjectionExecutor,
    SeqScanExecutor, SetClause, UpdateExecutor,
};
use tessera::storage::disk::DiskManager;
use tessera::tuple::{ColType, ColumnRef, Record, Schema, Value};

fn setup() -> (ExecContext, TempDir) {
    let dir = TempDir::new().unwrap();
    let bpm = Arc::new(BufferPoolManager::new(16, Arc::new(DiskManager::new())));
    let catalog = Arc::new(Catalog::new(bpm, dir.path()).unwrap());
    (ExecContext::new(catalog, Transaction::new(1)), dir)
}

fn insert(ctx: &ExecContext, table: &str, values: Vec<Value>) {
    ctx.catalog().insert_row(table, &values, ctx.txn()).unwrap();
}

fn rows(schema: &Schema, records: &[Record]) -> Vec<Vec<Value>> {
    records
        .iter()
        .map(|r| schema.columns().iter().map(|c| r.value(c)).collect())
        .collect()
}

fn int_pairs(ctx: &ExecContext, table: &str, pairs: &[(i32, i32)]) {
    ctx.catalog()
        .create_table(table, &[("a", ColType::Int), ("b", ColType::Int)])
        .unwrap();
    for &(a, b) in pairs {
        insert(ctx, table, vec![a.into(), b.into()]);
    }
}

#[test]
fn test_seq_scan_filters() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10), (2, 20), (3, 30), (4, 40)]);

    let mut scan = SeqScanExecutor::new(
        &ctx,
        "t",
        vec![
            Condition::with_value(ColumnRef::bare("a"), CompOp::Ge, 2i32),
            Condition::with_value(ColumnRef::new("t", "b"), CompOp::Ne, 30i32),
        ],
    )
    .unwrap();
    assert!(scan.done());

    let records = execution::collect(&mut scan).unwrap();
    assert_eq!(
        rows(scan.schema(), &records),
        vec![
            vec![Value::Int(2), Value::Int(20)],
            vec![Value::Int(4), Value::Int(40)],
        ]
    );
    assert!(scan.done());
    assert!(scan.rid().is_none());
    assert!(scan.materialize().unwrap().is_none());
}

#[test]
fn test_seq_scan_compares_columns_of_one_row() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 1), (2, 5), (7, 3)]);

    let mut scan = SeqScanExecutor::new(
        &ctx,
        "t",
        vec![Condition::with_column(ColumnRef::bare("a"), CompOp::Lt, ColumnRef::bare("b"))],
    )
    .unwrap();
    let records = execution::collect(&mut scan).unwrap();
    assert_eq!(rows(scan.schema(), &records), vec![vec![Value::Int(2), Value::Int(5)]]);
}

#[test]
fn test_seq_scan_errors() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10)]);

    assert!(matches!(
        SeqScanExecutor::new(&ctx, "missing", vec![]),
        Err(TesseraError::TableNotFound(_))
    ));

    let mut scan = SeqScanExecutor::new(
        &ctx,
        "t",
        vec![Condition::with_value(ColumnRef::bare("a"), CompOp::Eq, "one")],
    )
    .unwrap();
    assert!(matches!(scan.open(), Err(TesseraError::TypeMismatch { .. })));

    let mut scan = SeqScanExecutor::new(
        &ctx,
        "t",
        vec![Condition::with_value(ColumnRef::bare("z"), CompOp::Eq, 1i32)],
    )
    .unwrap();
    assert!(matches!(scan.open(), Err(TesseraError::ColumnNotFound(_))));
}

#[test]
fn test_seq_scan_reopen_restarts() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10), (2, 20)]);

    let mut scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    assert_eq!(execution::collect(&mut scan).unwrap().len(), 2);
    assert_eq!(execution::collect(&mut scan).unwrap().len(), 2);
}

#[test]
fn test_nested_loop_join() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "l", &[(1, 10), (2, 20)]);
    ctx.catalog()
        .create_table("r", &[("a", ColType::Int), ("c", ColType::Char(4))])
        .unwrap();
    for (a, c) in [(1, "x"), (2, "y"), (1, "z"), (3, "w")] {
        insert(&ctx, "r", vec![Value::Int(a), c.into()]);
    }

    let mut join = NestedLoopJoinExecutor::new(
        Box::new(SeqScanExecutor::new(&ctx, "l", vec![]).unwrap()),
        Box::new(SeqScanExecutor::new(&ctx, "r", vec![]).unwrap()),
        vec![Condition::with_column(
            ColumnRef::new("l", "a"),
            CompOp::Eq,
            ColumnRef::new("r", "a"),
        )],
    );
    assert_eq!(join.record_len(), 16);

    let records = execution::collect(&mut join).unwrap();
    let s = |v: &str| Value::Str(v.to_string());
    assert_eq!(
        rows(join.schema(), &records),
        vec![
            vec![Value::Int(1), Value::Int(10), Value::Int(1), s("x")],
            vec![Value::Int(1), Value::Int(10), Value::Int(1), s("z")],
            vec![Value::Int(2), Value::Int(20), Value::Int(2), s("y")],
        ]
    );
}

#[test]
fn test_self_join_on_aliases() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10), (2, 20)]);

    let mut join = NestedLoopJoinExecutor::new(
        Box::new(SeqScanExecutor::aliased(&ctx, "t", "l", vec![]).unwrap()),
        Box::new(SeqScanExecutor::aliased(&ctx, "t", "r", vec![]).unwrap()),
        vec![Condition::with_column(
            ColumnRef::new("l", "a"),
            CompOp::Eq,
            ColumnRef::new("r", "a"),
        )],
    );

    let records = execution::collect(&mut join).unwrap();
    assert_eq!(
        rows(join.schema(), &records),
        vec![
            vec![Value::Int(1), Value::Int(10), Value::Int(1), Value::Int(10)],
            vec![Value::Int(2), Value::Int(20), Value::Int(2), Value::Int(20)],
        ]
    );
}

#[test]
fn test_nested_loop_join_without_conditions_is_cross_product() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "l", &[(1, 10), (2, 20)]);
    int_pairs(&ctx, "r", &[(1, 10), (2, 20), (3, 30)]);

    let mut join = NestedLoopJoinExecutor::new(
        Box::new(SeqScanExecutor::new(&ctx, "l", vec![]).unwrap()),
        Box::new(SeqScanExecutor::new(&ctx, "r", vec![]).unwrap()),
        vec![],
    );
    assert_eq!(execution::collect(&mut join).unwrap().len(), 6);
}

#[test]
fn test_nested_loop_join_empty_side() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "l", &[(1, 10)]);
    int_pairs(&ctx, "r", &[]);

    let mut join = NestedLoopJoinExecutor::new(
        Box::new(SeqScanExecutor::new(&ctx, "l", vec![]).unwrap()),
        Box::new(SeqScanExecutor::new(&ctx, "r", vec![]).unwrap()),
        vec![],
    );
    assert!(execution::collect(&mut join).unwrap().is_empty());
    assert!(join.done());
}

#[test]
fn test_projection_reorders_columns() {
    let (ctx, _dir) = setup();
    ctx.catalog()
        .create_table(
            "t",
            &[("c1", ColType::Int), ("c2", ColType::Char(6)), ("c3", ColType::BigInt)],
        )
        .unwrap();
    insert(&ctx, "t", vec![Value::Int(7), "abc".into(), Value::BigInt(-1)]);

    let scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    let mut projection = ProjectionExecutor::new(
        Box::new(scan),
        &[ColumnRef::bare("c2"), ColumnRef::bare("c1")],
    )
    .unwrap();
    assert_eq!(projection.record_len(), 10);

    let records = execution::collect(&mut projection).unwrap();
    assert_eq!(records[0].data(), &[b'a', b'b', b'c', 0, 0, 0, 7, 0, 0, 0]);
    assert_eq!(
        rows(projection.schema(), &records),
        vec![vec![Value::Str("abc".into()), Value::Int(7)]]
    );

    let scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    assert!(matches!(
        ProjectionExecutor::new(Box::new(scan), &[ColumnRef::bare("nope")]),
        Err(TesseraError::ColumnNotFound(_))
    ));
}

#[test]
fn test_update_moves_index_entry() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10), (2, 20)]);
    ctx.catalog().create_index("t", &["a"]).unwrap();

    let mut scan = SeqScanExecutor::new(
        &ctx,
        "t",
        vec![Condition::with_value(ColumnRef::bare("a"), CompOp::Eq, 1i32)],
    )
    .unwrap();
    let rids = execution::collect_rids(&mut scan).unwrap();
    assert_eq!(rids.len(), 1);

    let mut update = UpdateExecutor::new(
        &ctx,
        "t",
        &[SetClause::new(ColumnRef::bare("a"), 99i32)],
        rids.clone(),
    )
    .unwrap();
    assert_eq!(update.rows_updated(), None);
    update.open().unwrap();
    assert!(update.done());
    assert_eq!(update.rows_updated(), Some(1));

    let index = ctx.catalog().index("t", &["a"]).unwrap();
    assert_eq!(index.get(&99i32.to_le_bytes()).unwrap(), Some(rids[0]));
    assert_eq!(index.get(&1i32.to_le_bytes()).unwrap(), None);

    let mut scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    let records = execution::collect(&mut scan).unwrap();
    assert_eq!(
        rows(scan.schema(), &records),
        vec![
            vec![Value::Int(99), Value::Int(10)],
            vec![Value::Int(2), Value::Int(20)],
        ]
    );
}

#[test]
fn test_update_rejects_bad_assignments() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10)]);

    assert!(matches!(
        UpdateExecutor::new(&ctx, "t", &[SetClause::new(ColumnRef::bare("zz"), 1i32)], vec![]),
        Err(TesseraError::ColumnNotFound(_))
    ));
    assert!(matches!(
        UpdateExecutor::new(&ctx, "t", &[SetClause::new(ColumnRef::bare("a"), 1i64)], vec![]),
        Err(TesseraError::TypeMismatch { .. })
    ));
}

#[test]
fn test_update_missing_record() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10)]);
    let heap = ctx.catalog().heap_file("t").unwrap();
    let rid = heap.lock().scan().unwrap().next().unwrap().unwrap();
    heap.lock().delete(rid).unwrap();

    let mut update = UpdateExecutor::new(
        &ctx,
        "t",
        &[SetClause::new(ColumnRef::bare("b"), 0i32)],
        vec![rid],
    )
    .unwrap();
    assert!(matches!(update.execute(), Err(TesseraError::RecordNotFound(_))));
}

fn key(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn test_update_rejected_by_index_restores_entries() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10), (2, 20)]);
    ctx.catalog().create_index("t", &["b", "a"]).unwrap();
    ctx.catalog().create_index("t", &["a"]).unwrap();

    let mut scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    let rids = execution::collect_rids(&mut scan).unwrap();

    let mut update = UpdateExecutor::new(
        &ctx,
        "t",
        &[SetClause::new(ColumnRef::bare("a"), 99i32)],
        rids.clone(),
    )
    .unwrap();
    assert!(matches!(update.execute(), Err(TesseraError::DuplicateKey)));

    let by_a = ctx.catalog().index("t", &["a"]).unwrap();
    assert_eq!(by_a.get(&key(&[99])).unwrap(), Some(rids[0]));
    assert_eq!(by_a.get(&key(&[2])).unwrap(), Some(rids[1]));

    let by_ba = ctx.catalog().index("t", &["b", "a"]).unwrap();
    assert_eq!(by_ba.get(&key(&[10, 99])).unwrap(), Some(rids[0]));
    assert_eq!(by_ba.get(&key(&[20, 2])).unwrap(), Some(rids[1]));
    assert_eq!(by_ba.get(&key(&[20, 99])).unwrap(), None);

    let mut scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    let records = execution::collect(&mut scan).unwrap();
    assert_eq!(
        rows(scan.schema(), &records),
        vec![
            vec![Value::Int(99), Value::Int(10)],
            vec![Value::Int(2), Value::Int(20)],
        ]
    );
}

#[test]
fn test_update_keeps_untouched_index() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10), (2, 20)]);
    ctx.catalog().create_index("t", &["a"]).unwrap();
    ctx.catalog().create_index("t", &["b"]).unwrap();

    let mut scan = SeqScanExecutor::new(
        &ctx,
        "t",
        vec![Condition::with_value(ColumnRef::bare("b"), CompOp::Eq, 20i32)],
    )
    .unwrap();
    let rids = execution::collect_rids(&mut scan).unwrap();

    let mut update = UpdateExecutor::new(
        &ctx,
        "t",
        &[SetClause::new(ColumnRef::bare("a"), 5i32)],
        rids.clone(),
    )
    .unwrap();
    assert_eq!(update.execute().unwrap(), 1);

    let by_a = ctx.catalog().index("t", &["a"]).unwrap();
    assert_eq!(by_a.get(&key(&[5])).unwrap(), Some(rids[0]));
    assert_eq!(by_a.get(&key(&[2])).unwrap(), None);
    assert!(by_a.get(&key(&[1])).unwrap().is_some());

    let by_b = ctx.catalog().index("t", &["b"]).unwrap();
    assert_eq!(by_b.get(&key(&[20])).unwrap(), Some(rids[0]));
    assert!(by_b.get(&key(&[10])).unwrap().is_some());
}

#[test]
fn test_three_way_join() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "x", &[(1, 10), (2, 20)]);
    int_pairs(&ctx, "y", &[(10, 100), (20, 200), (30, 300)]);
    int_pairs(&ctx, "z", &[(200, 7), (100, 8), (200, 9)]);

    let inner = NestedLoopJoinExecutor::new(
        Box::new(SeqScanExecutor::new(&ctx, "x", vec![]).unwrap()),
        Box::new(SeqScanExecutor::new(&ctx, "y", vec![]).unwrap()),
        vec![Condition::with_column(
            ColumnRef::new("x", "b"),
            CompOp::Eq,
            ColumnRef::new("y", "a"),
        )],
    );
    let mut join = NestedLoopJoinExecutor::new(
        Box::new(inner),
        Box::new(SeqScanExecutor::new(&ctx, "z", vec![]).unwrap()),
        vec![Condition::with_column(
            ColumnRef::new("y", "b"),
            CompOp::Eq,
            ColumnRef::new("z", "a"),
        )],
    );
    assert_eq!(join.record_len(), 24);

    let records = execution::collect(&mut join).unwrap();
    let ints = |v: [i32; 6]| v.into_iter().map(Value::Int).collect::<Vec<_>>();
    assert_eq!(
        rows(join.schema(), &records),
        vec![
            ints([1, 10, 10, 100, 100, 8]),
            ints([2, 20, 20, 200, 200, 7]),
            ints([2, 20, 20, 200, 200, 9]),
        ]
    );
}

#[test]
fn test_join_over_projection() {
    let (ctx, _dir) = setup();
    ctx.catalog()
        .create_table("l", &[("tag", ColType::Char(4)), ("k", ColType::Int)])
        .unwrap();
    insert(&ctx, "l", vec!["p".into(), Value::Int(1)]);
    insert(&ctx, "l", vec!["q".into(), Value::Int(2)]);
    int_pairs(&ctx, "r", &[(2, 20), (1, 10), (2, 21)]);

    let left = ProjectionExecutor::new(
        Box::new(SeqScanExecutor::new(&ctx, "l", vec![]).unwrap()),
        &[ColumnRef::bare("k")],
    )
    .unwrap();
    let mut join = NestedLoopJoinExecutor::new(
        Box::new(left),
        Box::new(SeqScanExecutor::new(&ctx, "r", vec![]).unwrap()),
        vec![Condition::with_column(
            ColumnRef::new("l", "k"),
            CompOp::Eq,
            ColumnRef::new("r", "a"),
        )],
    );
    assert_eq!(join.record_len(), 12);

    let records = execution::collect(&mut join).unwrap();
    assert_eq!(
        rows(join.schema(), &records),
        vec![
            vec![Value::Int(1), Value::Int(1), Value::Int(10)],
            vec![Value::Int(2), Value::Int(2), Value::Int(20)],
            vec![Value::Int(2), Value::Int(2), Value::Int(21)],
        ]
    );
}

#[test]
fn test_update_with_missing_index_entry() {
    let (ctx, _dir) = setup();
    int_pairs(&ctx, "t", &[(1, 10)]);
    ctx.catalog().create_index("t", &["a"]).unwrap();
    let by_a = ctx.catalog().index("t", &["a"]).unwrap();

    let mut scan = SeqScanExecutor::new(&ctx, "t", vec![]).unwrap();
    let rids = execution::collect_rids(&mut scan).unwrap();
    assert!(by_a.delete_entry(&key(&[1]), ctx.txn()).unwrap());

    let mut update = UpdateExecutor::new(
        &ctx,
        "t",
        &[SetClause::new(ColumnRef::bare("a"), 3i32)],
        rids.clone(),
    )
    .unwrap();
    assert_eq!(update.execute().unwrap(), 1);
    assert_eq!(by_a.get(&key(&[3])).unwrap(), Some(rids[0]));
}
