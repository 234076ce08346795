mod heap_file;
mod table_scanner;

pub use heap_file::*;
pub use table_scanner::*;
