use std::path::PathBuf;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Owned image of one page
pub type PageData = Box<[u8; PAGE_SIZE]>;

/// Sentinel stored on disk for "no page" in free-list links
pub const NO_PAGE: u32 = u32::MAX;

/// Default buffer pool size (number of frames)
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 64;

/// Page number of the heap file header page
pub const FILE_HEADER_PAGE: u32 = 0;

/// First page number that holds records
pub const FIRST_RECORD_PAGE: u32 = 1;

/// Extension used for heap files created by the catalog
pub const HEAP_FILE_EXTENSION: &str = "tbl";

/// Default directory for table files
pub const DEFAULT_DATA_DIR: &str = "tessera_data";

/// Runtime configuration for a database instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of frames in the buffer pool
    pub buffer_pool_size: usize,
    /// Directory holding one heap file per table
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(buffer_pool_size: usize, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            buffer_pool_size,
            data_dir: data_dir.into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_POOL_SIZE, DEFAULT_DATA_DIR)
    }
}
