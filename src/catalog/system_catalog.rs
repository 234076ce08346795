use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::buffer::BufferPoolManager;
use crate::common::{Result, Rid, TesseraError, Transaction, HEAP_FILE_EXTENSION};
use crate::index::{IndexHandle, MemoryIndex};
use crate::storage::table::HeapFile;
use crate::tuple::{ColType, ColumnRef, Record, Schema, Value};

use super::{IndexMeta, TableMeta};

/// Everything the catalog keeps for one table
struct TableEntry {
    meta: Arc<TableMeta>,
    heap: Arc<Mutex<HeapFile>>,
    indexes: Vec<Arc<dyn IndexHandle>>,
}

/// In-memory catalog: table layouts plus the heap file and index handles
/// behind them. Each table lives in `<data_dir>/<name>.tbl`.
pub struct Catalog {
    bpm: Arc<BufferPoolManager>,
    data_dir: PathBuf,
    tables: RwLock<HashMap<String, TableEntry>>,
}

impl Catalog {
    pub fn new<P: AsRef<Path>>(bpm: Arc<BufferPoolManager>, data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            bpm,
            data_dir,
            tables: RwLock::new(HashMap::new()),
        })
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPoolManager> {
        &self.bpm
    }

    /// Path of the heap file backing a table.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(name)
            .with_extension(HEAP_FILE_EXTENSION)
    }

    /// Creates a table with columns laid out in declaration order.
    pub fn create_table(&self, name: &str, columns: &[(&str, ColType)]) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(TesseraError::TableAlreadyExists(name.to_string()));
        }

        let schema = Schema::for_table(name, columns);
        let heap = HeapFile::create(
            Arc::clone(&self.bpm),
            self.table_path(name),
            schema.record_len(),
        )?;

        tables.insert(
            name.to_string(),
            TableEntry {
                meta: Arc::new(TableMeta::new(name, schema)),
                heap: Arc::new(Mutex::new(heap)),
                indexes: Vec::new(),
            },
        );
        info!("Created table {}", name);
        Ok(())
    }

    /// Creates a unique index on `columns` and fills it from the table.
    pub fn create_index(&self, table: &str, columns: &[&str]) -> Result<()> {
        let mut tables = self.tables.write();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| TesseraError::TableNotFound(table.to_string()))?;

        if entry.meta.index_on(columns).is_some() {
            return Err(TesseraError::IndexAlreadyExists(format!(
                "{}({})",
                table,
                columns.join(", ")
            )));
        }

        let key_columns = columns
            .iter()
            .map(|&name| {
                entry
                    .meta
                    .schema
                    .resolve(&ColumnRef::bare(name))
                    .cloned()
            })
            .collect::<Result<Vec<_>>>()?;
        let index_meta = IndexMeta::new(table, key_columns);

        let index = Arc::new(MemoryIndex::new());
        let txn = Transaction::new(0);
        {
            let heap = entry.heap.lock();
            for rid in heap.scan()? {
                let rid = rid?;
                let record = heap.get(rid)?;
                index.insert_entry(&index_meta.key_from(&record), rid, &txn)?;
            }
        }
        debug!("Index {} back-filled with {} entries", index_meta, index.len());

        let mut meta = (*entry.meta).clone();
        meta.indexes.push(index_meta);
        entry.meta = Arc::new(meta);
        entry.indexes.push(index);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<Arc<TableMeta>> {
        self.tables
            .read()
            .get(name)
            .map(|e| Arc::clone(&e.meta))
            .ok_or_else(|| TesseraError::TableNotFound(name.to_string()))
    }

    pub fn heap_file(&self, name: &str) -> Result<Arc<Mutex<HeapFile>>> {
        self.tables
            .read()
            .get(name)
            .map(|e| Arc::clone(&e.heap))
            .ok_or_else(|| TesseraError::TableNotFound(name.to_string()))
    }

    /// The index keyed on exactly `columns`, in that order.
    pub fn index(&self, table: &str, columns: &[&str]) -> Result<Arc<dyn IndexHandle>> {
        let tables = self.tables.read();
        let entry = tables
            .get(table)
            .ok_or_else(|| TesseraError::TableNotFound(table.to_string()))?;

        entry
            .meta
            .indexes
            .iter()
            .position(|ix| ix.is_on(columns))
            .map(|i| Arc::clone(&entry.indexes[i]))
            .ok_or_else(|| {
                TesseraError::IndexNotFound(format!("{}({})", table, columns.join(", ")))
            })
    }

    /// Every index of a table paired with its handle, in creation order.
    pub fn indexes(&self, table: &str) -> Result<Vec<(IndexMeta, Arc<dyn IndexHandle>)>> {
        let tables = self.tables.read();
        let entry = tables
            .get(table)
            .ok_or_else(|| TesseraError::TableNotFound(table.to_string()))?;

        Ok(entry
            .meta
            .indexes
            .iter()
            .cloned()
            .zip(entry.indexes.iter().cloned())
            .collect())
    }

    /// Encodes a row, stores it and adds it to every index of the table.
    /// Nothing is left behind if an index rejects the row.
    pub fn insert_row(&self, table: &str, values: &[Value], txn: &Transaction) -> Result<Rid> {
        let meta = self.table(table)?;
        let schema = &meta.schema;
        if values.len() != schema.len() {
            return Err(TesseraError::TypeMismatch {
                expected: format!("{} values", schema.len()),
                found: format!("{} values", values.len()),
            });
        }

        let mut record = Record::zeroed(schema.record_len());
        for (col, value) in schema.columns().iter().zip(values) {
            record.set_column(col, &value.encode(&col.ty)?);
        }

        let indexes = self.indexes(table)?;
        let heap = self.heap_file(table)?;
        let mut heap = heap.lock();
        let rid = heap.insert(record.data())?;

        for (done, (index_meta, index)) in indexes.iter().enumerate() {
            let key = index_meta.key_from(&record);
            if let Err(e) = index.insert_entry(&key, rid, txn) {
                warn!("Insert into {} rejected by index {}: {}", table, index_meta, e);
                for (prev_meta, prev) in &indexes[..done] {
                    prev.delete_entry(&prev_meta.key_from(&record), txn)?;
                }
                heap.delete(rid)?;
                return Err(e);
            }
        }

        Ok(rid)
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Writes every table's header and dirty pages to disk.
    pub fn flush_all(&self) -> Result<()> {
        for entry in self.tables.read().values() {
            entry.heap.lock().flush()?;
        }
        Ok(())
    }
}
