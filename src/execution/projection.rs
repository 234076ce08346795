use crate::common::{Result, Rid};
use crate::tuple::{ColumnRef, Record, Schema};

use super::Executor;

/// Keeps a subset of the child's columns, packed in the requested order.
pub struct ProjectionExecutor {
    child: Box<dyn Executor>,
    /// Position in the child schema of each output column
    positions: Vec<usize>,
    schema: Schema,
}

impl ProjectionExecutor {
    pub fn new(child: Box<dyn Executor>, columns: &[ColumnRef]) -> Result<Self> {
        let (positions, schema) = child.schema().project(columns)?;
        Ok(Self {
            child,
            positions,
            schema,
        })
    }
}

impl Executor for ProjectionExecutor {
    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn advance(&mut self) -> Result<()> {
        self.child.advance()
    }

    fn materialize(&self) -> Result<Option<Record>> {
        let Some(input) = self.child.materialize()? else {
            return Ok(None);
        };

        let child_schema = self.child.schema();
        let mut output = Record::zeroed(self.schema.record_len());
        for (out_col, &pos) in self.schema.columns().iter().zip(&self.positions) {
            let src = &child_schema.columns()[pos];
            output.set_column(out_col, input.column(src));
        }
        Ok(Some(output))
    }

    fn done(&self) -> bool {
        self.child.done()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rid(&self) -> Option<Rid> {
        self.child.rid()
    }

    fn name(&self) -> &'static str {
        "ProjectionExecutor"
    }
}
