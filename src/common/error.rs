use thiserror::Error;

use super::types::{FileId, PageId, Rid};

/// Database error types
#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page {0} not found")]
    PageNotFound(PageId),

    #[error("Record {0} not found")]
    RecordNotFound(Rid),

    #[error("File {0} is not open")]
    FileNotOpen(FileId),

    #[error("File {0} already exists")]
    FileExists(String),

    #[error("Invalid heap file: {0}")]
    InvalidHeapFile(String),

    #[error("Buffer pool is full, no evictable frames available")]
    BufferPoolFull,

    #[error("Page {0} is still pinned")]
    PageStillPinned(PageId),

    #[error("Disk scheduler error: {0}")]
    DiskScheduler(String),

    #[error("Record size mismatch: expected {expected} bytes, got {found}")]
    RecordSizeMismatch { expected: usize, found: usize },

    #[error("Incompatible types: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Column {0} not found")]
    ColumnNotFound(String),

    #[error("Value does not fit in {0} bytes")]
    ValueOverflow(usize),

    #[error("Table {0} already exists")]
    TableAlreadyExists(String),

    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error("Index {0} not found")]
    IndexNotFound(String),

    #[error("Index {0} already exists")]
    IndexAlreadyExists(String),

    #[error("Duplicate key in index")]
    DuplicateKey,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TesseraError>;
