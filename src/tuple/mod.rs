mod col_type;
mod record;
mod schema;
mod value;

pub use col_type::ColType;
pub use record::Record;
pub use schema::{ColumnMeta, ColumnRef, Schema};
pub use value::Value;
