//! Tessera - heap-file storage and pull-based query execution for a
//! teaching RDBMS
//!
//! # Architecture
//!
//! The crate is organized in layers, each built on the ones listed before it:
//!
//! - **Storage** (`storage`): page I/O and record layout
//!   - `DiskManager`: reads and writes pages of many open files
//!   - `DiskScheduler`: runs page I/O on a background worker thread
//!   - `RecordPage` / `FileHeader`: fixed-length slot pages and the file header
//!   - `HeapFile`: record CRUD by `Rid` with a LIFO free-page list
//!   - `TableScanner`: forward scan over the live records of a heap file
//!
//! - **Buffer Pool** (`buffer`): page caching
//!   - `BufferPoolManager`: caches pages in a fixed number of frames
//!   - `LruReplacer`: picks the least recently unpinned frame to evict
//!   - `ReadPageGuard` / `WritePageGuard`: RAII pins on cached pages
//!
//! - **Tuples** (`tuple`): `ColType`, `Value`, `Schema` and owned `Record`s
//!
//! - **Index** (`index`): the `IndexHandle` capability and `MemoryIndex`
//!
//! - **Catalog** (`catalog`): table layouts, heap files and index handles
//!
//! - **Execution** (`execution`): sequential scan, nested-loop join,
//!   projection and update executors
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera::buffer::BufferPoolManager;
//! use tessera::catalog::Catalog;
//! use tessera::common::Transaction;
//! use tessera::execution::{self, CompOp, Condition, ExecContext, SeqScanExecutor};
//! use tessera::storage::disk::DiskManager;
//! use tessera::tuple::{ColType, ColumnRef, Value};
//!
//! let bpm = Arc::new(BufferPoolManager::new(64, Arc::new(DiskManager::new())));
//! let catalog = Arc::new(Catalog::new(bpm, "data").unwrap());
//! catalog.create_table("t", &[("a", ColType::Int), ("b", ColType::Int)]).unwrap();
//!
//! let txn = Transaction::new(1);
//! catalog.insert_row("t", &[Value::Int(1), Value::Int(10)], &txn).unwrap();
//!
//! let ctx = ExecContext::new(catalog, txn);
//! let cond = Condition::with_value(ColumnRef::bare("a"), CompOp::Eq, 1i32);
//! let mut scan = SeqScanExecutor::new(&ctx, "t", vec![cond]).unwrap();
//! let rows = execution::collect(&mut scan).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod execution;
pub mod index;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{PageId, Result, Rid, TesseraError};
