use std::fs;
use std::sync::Arc;

use log::info;

use tessera::buffer::BufferPoolManager;
use tessera::catalog::Catalog;
use tessera::common::{Config, Transaction};
use tessera::execution::{
    self, CompOp, Condition, ExecContext, Executor, NestedLoopJoinExecutor, ProjectionExecutor,
    SeqScanExecutor, SetClause, UpdateExecutor,
};
use tessera::storage::disk::DiskManager;
use tessera::tuple::{ColType, ColumnRef, Record, Schema, Value};

fn print_rows(title: &str, schema: &Schema, rows: &[Record]) {
    println!("{}:", title);
    for row in rows {
        let values: Vec<String> = schema
            .columns()
            .iter()
            .map(|c| row.value(c).to_string())
            .collect();
        println!("  ({})", values.join(", "));
    }
}

fn main() -> tessera::Result<()> {
    env_logger::init();

    println!("Tessera - heap files and pull-based executors");
    println!("==============================================\n");

    let config = Config::default();
    // Start from an empty data directory on every run
    if config.data_dir.exists() {
        fs::remove_dir_all(&config.data_dir)?;
    }

    let bpm = Arc::new(BufferPoolManager::new(
        config.buffer_pool_size,
        Arc::new(DiskManager::new()),
    ));
    let catalog = Arc::new(Catalog::new(bpm, &config.data_dir)?);
    info!("Data directory: {}", config.data_dir.display());

    catalog.create_table(
        "emp",
        &[("id", ColType::Int), ("name", ColType::Char(8)), ("dept", ColType::Int)],
    )?;
    catalog.create_table("dept", &[("id", ColType::Int), ("title", ColType::Char(12))])?;
    catalog.create_index("emp", &["id"])?;

    let txn = Transaction::new(1);
    for (id, name, dept) in [(1, "ada", 10), (2, "brian", 20), (3, "cleo", 10)] {
        catalog.insert_row("emp", &[Value::Int(id), name.into(), Value::Int(dept)], &txn)?;
    }
    for (id, title) in [(10, "storage"), (20, "execution")] {
        catalog.insert_row("dept", &[Value::Int(id), title.into()], &txn)?;
    }

    let ctx = ExecContext::new(Arc::clone(&catalog), txn);

    // SELECT emp.name, dept.title FROM emp, dept WHERE emp.dept = dept.id
    let join = NestedLoopJoinExecutor::new(
        Box::new(SeqScanExecutor::new(&ctx, "emp", vec![])?),
        Box::new(SeqScanExecutor::new(&ctx, "dept", vec![])?),
        vec![Condition::with_column(
            ColumnRef::new("emp", "dept"),
            CompOp::Eq,
            ColumnRef::new("dept", "id"),
        )],
    );
    let mut projection = ProjectionExecutor::new(
        Box::new(join),
        &[ColumnRef::new("emp", "name"), ColumnRef::new("dept", "title")],
    )?;
    let rows = execution::collect(&mut projection)?;
    print_rows("emp JOIN dept", projection.schema(), &rows);

    // UPDATE emp SET dept = 20 WHERE dept = 10
    let mut scan = SeqScanExecutor::new(
        &ctx,
        "emp",
        vec![Condition::with_value(ColumnRef::bare("dept"), CompOp::Eq, 10i32)],
    )?;
    let rids = execution::collect_rids(&mut scan)?;
    let mut update = UpdateExecutor::new(
        &ctx,
        "emp",
        &[SetClause::new(ColumnRef::bare("dept"), 20i32)],
        rids,
    )?;
    let updated = update.execute()?;
    println!("\nUpdated {} rows", updated);

    let mut scan = SeqScanExecutor::new(&ctx, "emp", vec![])?;
    let rows = execution::collect(&mut scan)?;
    print_rows("emp", scan.schema(), &rows);

    catalog.flush_all()?;
    println!("\nDemo completed successfully!");
    Ok(())
}
