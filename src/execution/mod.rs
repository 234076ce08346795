//! Pull-based executors.
//!
//! A tree is driven from the top: `open` once, then `materialize` and
//! `advance` alternately until `done`. [`collect`] is that loop.

mod condition;
mod context;
mod nested_loop_join;
mod projection;
mod seq_scan;
mod update;

pub use crate::tuple::ColumnRef;
pub use condition::{CompOp, Condition, Operand, SetClause};
pub use context::ExecContext;
pub use nested_loop_join::NestedLoopJoinExecutor;
pub use projection::ProjectionExecutor;
pub use seq_scan::SeqScanExecutor;
pub use update::UpdateExecutor;

use crate::common::{Result, Rid};
use crate::tuple::{Record, Schema};

/// Tuple-at-a-time operator.
pub trait Executor {
    /// Positions on the first output tuple, or the terminal state.
    /// Calling it again restarts the operator.
    fn open(&mut self) -> Result<()>;

    /// Moves past the current output tuple.
    fn advance(&mut self) -> Result<()>;

    /// Copy of the current output tuple; `None` once done.
    fn materialize(&self) -> Result<Option<Record>>;

    fn done(&self) -> bool;

    /// Layout of the records this operator produces.
    fn schema(&self) -> &Schema;

    fn record_len(&self) -> usize {
        self.schema().record_len()
    }

    /// Storage address of the current tuple, for operators that have one.
    fn rid(&self) -> Option<Rid> {
        None
    }

    fn name(&self) -> &'static str;
}

/// Runs an executor to completion and returns every record it produced.
pub fn collect(exec: &mut dyn Executor) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    exec.open()?;
    while !exec.done() {
        if let Some(record) = exec.materialize()? {
            records.push(record);
        }
        exec.advance()?;
    }
    Ok(records)
}

/// Runs an executor to completion and returns the address of every tuple,
/// e.g. to feed an [`UpdateExecutor`].
pub fn collect_rids(exec: &mut dyn Executor) -> Result<Vec<Rid>> {
    let mut rids = Vec::new();
    exec.open()?;
    while !exec.done() {
        if let Some(rid) = exec.rid() {
            rids.push(rid);
        }
        exec.advance()?;
    }
    Ok(rids)
}
