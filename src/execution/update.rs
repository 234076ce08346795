use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::common::{Result, Rid, TesseraError};
use crate::index::{IndexHandle, IndexMeta};
use crate::storage::table::HeapFile;
use crate::tuple::{ColumnMeta, Record, Schema};

use super::{ExecContext, Executor, SetClause};

/// In-place update of a fixed list of records, keeping the table's indexes
/// in step.
///
/// For each record: read it, apply the assignments to a copy, then for each
/// index delete the old key and insert the new one, then write the copy back.
/// Between an index's delete and its insert that index has no entry for the
/// record. If an index rejects the new key, the record's index entries are
/// restored to the old image and the heap row is left untouched.
pub struct UpdateExecutor {
    ctx: ExecContext,
    table: String,
    heap: Arc<Mutex<HeapFile>>,
    /// Assigned column and its encoded replacement
    assignments: Vec<(ColumnMeta, Vec<u8>)>,
    indexes: Vec<(IndexMeta, Arc<dyn IndexHandle>)>,
    rids: Vec<Rid>,
    rows_updated: Option<usize>,
    output: Schema,
}

impl UpdateExecutor {
    /// Resolves and encodes the assignments against the table's schema.
    /// Fails on an unknown column or a value of the wrong type.
    pub fn new(
        ctx: &ExecContext,
        table: &str,
        set_clauses: &[SetClause],
        rids: Vec<Rid>,
    ) -> Result<Self> {
        let catalog = ctx.catalog();
        let meta = catalog.table(table)?;

        let mut assignments = Vec::with_capacity(set_clauses.len());
        for clause in set_clauses {
            let col = meta.schema.resolve(&clause.column)?;
            if !clause.value.fits(&col.ty) {
                return Err(TesseraError::TypeMismatch {
                    expected: col.ty.to_string(),
                    found: clause.value.type_name().to_string(),
                });
            }
            assignments.push((col.clone(), clause.value.encode(&col.ty)?));
        }

        Ok(Self {
            ctx: ctx.clone(),
            table: table.to_string(),
            heap: catalog.heap_file(table)?,
            assignments,
            indexes: catalog.indexes(table)?,
            rids,
            rows_updated: None,
            output: Schema::default(),
        })
    }

    /// Applies the update to every target record and returns how many were
    /// updated.
    pub fn execute(&mut self) -> Result<usize> {
        let txn = self.ctx.txn();
        let mut heap = self.heap.lock();

        for &rid in &self.rids {
            let old = heap.get(rid)?;
            let mut new = old.clone();
            for (col, bytes) in &self.assignments {
                new.set_column(col, bytes);
            }

            for (done, (meta, index)) in self.indexes.iter().enumerate() {
                let old_key = meta.key_from(&old);
                let new_key = meta.key_from(&new);
                if !index.delete_entry(&old_key, txn)? {
                    warn!("Index {} had no entry for {} under {:?}", meta, rid, old_key);
                }
                if let Err(e) = index.insert_entry(&new_key, rid, txn) {
                    warn!(
                        "Update of {} in {} rejected by index {}: {}",
                        rid, self.table, meta, e
                    );
                    // Put back the pre-image keys; the heap row is unchanged
                    index.insert_entry(&old_key, rid, txn)?;
                    for (prev_meta, prev) in &self.indexes[..done] {
                        prev.delete_entry(&prev_meta.key_from(&new), txn)?;
                        prev.insert_entry(&prev_meta.key_from(&old), rid, txn)?;
                    }
                    return Err(e);
                }
                debug!("Moved {} entry of {} from {:?} to {:?}", meta, rid, old_key, new_key);
            }

            heap.update(rid, new.data())?;
        }

        debug!("Updated {} rows of {}", self.rids.len(), self.table);
        self.rows_updated = Some(self.rids.len());
        Ok(self.rids.len())
    }

    /// Rows touched by the last run, if it has run.
    pub fn rows_updated(&self) -> Option<usize> {
        self.rows_updated
    }
}

impl Executor for UpdateExecutor {
    /// Runs the whole update. The operator then has no output.
    fn open(&mut self) -> Result<()> {
        self.execute().map(|_| ())
    }

    fn advance(&mut self) -> Result<()> {
        Ok(())
    }

    fn materialize(&self) -> Result<Option<Record>> {
        Ok(None)
    }

    fn done(&self) -> bool {
        true
    }

    fn schema(&self) -> &Schema {
        &self.output
    }

    fn name(&self) -> &'static str {
        "UpdateExecutor"
    }
}
