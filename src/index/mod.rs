mod index_handle;
mod memory_index;

pub use index_handle::{IndexHandle, IndexMeta};
pub use memory_index::MemoryIndex;
