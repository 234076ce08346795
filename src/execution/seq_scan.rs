use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{Result, Rid};
use crate::storage::table::{HeapFile, TableScanner};
use crate::tuple::{ColumnMeta, Record, Schema};

use super::condition::eval_all;
use super::{Condition, ExecContext, Executor};

/// Full scan of one table, keeping the tuples that satisfy every condition.
pub struct SeqScanExecutor {
    heap: Arc<Mutex<HeapFile>>,
    schema: Schema,
    conds: Vec<Condition>,
    scanner: Option<TableScanner>,
}

impl SeqScanExecutor {
    pub fn new(ctx: &ExecContext, table: &str, conds: Vec<Condition>) -> Result<Self> {
        Self::aliased(ctx, table, table, conds)
    }

    /// Scans `table` under another name: output columns and conditions are
    /// qualified by `alias`, so one table can appear on both sides of a join.
    pub fn aliased(
        ctx: &ExecContext,
        table: &str,
        alias: &str,
        conds: Vec<Condition>,
    ) -> Result<Self> {
        let meta = ctx.catalog().table(table)?;
        Ok(Self {
            heap: ctx.catalog().heap_file(table)?,
            schema: meta.schema.renamed(alias),
            conds,
            scanner: None,
        })
    }

    /// Skips forward from the scanner's position to the first tuple that
    /// satisfies every condition.
    fn seek_match(&mut self) -> Result<()> {
        let Some(scanner) = self.scanner.as_mut() else {
            return Ok(());
        };

        while !scanner.done() {
            let record = self.heap.lock().get(scanner.rid())?;
            if eval_all(&self.conds, &self.schema, |c: &ColumnMeta| record.column(c))? {
                return Ok(());
            }
            scanner.advance()?;
        }
        Ok(())
    }
}

impl Executor for SeqScanExecutor {
    fn open(&mut self) -> Result<()> {
        self.scanner = Some(self.heap.lock().scan()?);
        self.seek_match()
    }

    fn advance(&mut self) -> Result<()> {
        match self.scanner.as_mut() {
            Some(scanner) if !scanner.done() => scanner.advance()?,
            _ => return Ok(()),
        }
        self.seek_match()
    }

    fn materialize(&self) -> Result<Option<Record>> {
        match self.rid() {
            Some(rid) => self.heap.lock().get(rid).map(Some),
            None => Ok(None),
        }
    }

    fn done(&self) -> bool {
        self.scanner.as_ref().map_or(true, |s| s.done())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rid(&self) -> Option<Rid> {
        self.scanner
            .as_ref()
            .filter(|s| !s.done())
            .map(|s| s.rid())
    }

    fn name(&self) -> &'static str {
        "SeqScanExecutor"
    }
}
