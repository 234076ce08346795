mod system_catalog;
mod table_meta;

pub use crate::index::IndexMeta;
pub use system_catalog::Catalog;
pub use table_meta::TableMeta;
