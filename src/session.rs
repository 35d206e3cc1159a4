//! The execution calls a prepared batch has to support.
//!
//! Each call maps to one of the ways a client library can run a batch; the
//! benchmark driver times exactly one of them per iteration.

use crate::command::BatchCommand;
use crate::Result;

/// A row of integer columns. `None` is SQL `NULL`.
pub type Row = Vec<Option<i64>>;

/// One result set as seen by a reader that fetches a single row from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    /// First row, if the result set had any.
    pub first_row: Option<Row>,
}

impl ResultSet {
    /// Leading column of the first row.
    pub fn value(&self) -> Option<i64> {
        self.first_row.as_ref().and_then(|row| row.first().copied().flatten())
    }
}

/// A command compiled once against a connection and executed many times.
///
/// Parameter slots stay bound between executions; only values set through
/// [`PreparedBatch::set_parameter`] change.
pub trait PreparedBatch {
    fn command(&self) -> &BatchCommand;

    /// Runs the batch and moves through every result set it produces, reading
    /// the first row of each and discarding the rest.
    fn execute_reader(&mut self) -> Result<Vec<ResultSet>>;

    /// Runs the batch and reads only the first row of the first result set.
    fn execute_single_row(&mut self) -> Result<Option<Row>>;

    /// Runs the batch and returns the first column of the first row.
    fn execute_scalar(&mut self) -> Result<Option<i64>>;

    /// Runs the batch without requesting any result set. Returns the number of
    /// rows changed. Output parameters are populated on return.
    fn execute_non_query(&mut self) -> Result<usize>;

    fn set_parameter(&mut self, name: &str, value: Option<i64>) -> Result<()>;

    /// Current value of a parameter, including values written back by the
    /// last execution.
    fn parameter(&self, name: &str) -> Option<i64> {
        self.command().parameter(name).and_then(|p| p.value)
    }
}
