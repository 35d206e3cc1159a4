//! The timing loop.
//!
//! Each case gets its own connection and its own prepared command. Values are
//! randomized once, when the command is built; the loop only re-executes it.
//! Any failure ends the run: there are no retries.

use std::fmt;
use std::io::Write;
use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use crate::command::{BatchCommand, Strategy, ROWS_AFFECTED};
use crate::config::BenchConfig;
use crate::session::{PreparedBatch, ResultSet, Row};
use crate::sqlite::Database;
use crate::timing::TickAccumulator;
use crate::Result;

/// What a single execution observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ResultSets(Vec<ResultSet>),
    Row(Option<Row>),
    Scalar(Option<i64>),
    NonQuery {
        changed: usize,
        rows_affected: Option<i64>,
    },
}

impl Outcome {
    /// The XOR accumulator, for strategies that produce one.
    pub fn accumulator(&self) -> Option<i64> {
        match self {
            Outcome::ResultSets(_) => None,
            Outcome::Row(row) => row.as_ref().and_then(|r| r.first().copied().flatten()),
            Outcome::Scalar(value) => *value,
            Outcome::NonQuery { rows_affected, .. } => *rows_affected,
        }
    }
}

/// Runs `batch` once the way `strategy` retrieves results.
///
/// For [`Strategy::NonQueryInOut`] the accumulator is reset to zero first, so
/// no value leaks from the previous execution.
pub fn execute_once<B>(strategy: Strategy, batch: &mut B) -> Result<Outcome>
where
    B: PreparedBatch + ?Sized,
{
    let outcome = match strategy {
        Strategy::MultipleReaders => Outcome::ResultSets(batch.execute_reader()?),
        Strategy::SingleReader => Outcome::Row(batch.execute_single_row()?),
        Strategy::ExecuteScalar => Outcome::Scalar(batch.execute_scalar()?),
        Strategy::NonQueryOutput => Outcome::NonQuery {
            changed: batch.execute_non_query()?,
            rows_affected: batch.parameter(ROWS_AFFECTED),
        },
        Strategy::NonQueryInOut => {
            batch.set_parameter(ROWS_AFFECTED, Some(0))?;
            Outcome::NonQuery {
                changed: batch.execute_non_query()?,
                rows_affected: batch.parameter(ROWS_AFFECTED),
            }
        }
    };
    Ok(outcome)
}

/// Timing summary of one case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub name: &'static str,
    pub iterations: u32,
    pub total_ticks: u64,
}

impl CaseReport {
    fn new(name: &'static str, acc: &TickAccumulator) -> Self {
        Self {
            name,
            iterations: acc.iterations(),
            total_ticks: acc.total(),
        }
    }

    pub fn average_ticks(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total_ticks as f64 / f64::from(self.iterations)
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "-- {} --", self.name)?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(f, "Average ticks: {}", self.average_ticks())
    }
}

/// Executes `batch` `iterations` times, timing only the execution calls.
///
/// `observe` sees every outcome, outside the timed region.
pub fn run_case<B, F>(batch: &mut B, iterations: u32, mut observe: F) -> Result<CaseReport>
where
    B: PreparedBatch + ?Sized,
    F: FnMut(u32, &Outcome),
{
    let strategy = batch.command().strategy();
    let name = strategy.name();
    info!(case = name, iterations, "running case");

    let mut acc = TickAccumulator::new();
    for iteration in 0..iterations {
        let start = Instant::now();
        let result = execute_once(strategy, batch);
        let elapsed = start.elapsed();
        let outcome = result.map_err(|e| e.in_case(name, Some(iteration)))?;
        acc.record(elapsed);
        observe(iteration, &outcome);
    }

    let report = CaseReport::new(name, &acc);
    info!(
        case = name,
        total_ticks = report.total_ticks,
        average_ticks = report.average_ticks(),
        "case finished"
    );
    Ok(report)
}

/// Opens a connection, builds and prepares the command for `strategy`, and
/// runs it. The connection is closed before returning.
pub fn run_strategy<R, F>(
    config: &BenchConfig,
    strategy: Strategy,
    rng: &mut R,
    observe: F,
) -> Result<CaseReport>
where
    R: Rng + ?Sized,
    F: FnMut(u32, &Outcome),
{
    let name = strategy.name();
    let db = Database::open(&config.database).map_err(|e| e.in_case(name, None))?;
    let command = BatchCommand::build(strategy, config.pairs, config.max_random, rng);
    let mut batch = db.prepare(command).map_err(|e| e.in_case(name, None))?;
    run_case(&mut batch, config.iterations, observe)
}

/// Runs every strategy in order, writing each report to `out` as soon as its
/// case completes. Stops at the first failure.
pub fn run_all<R, W>(config: &BenchConfig, rng: &mut R, out: &mut W) -> Result<Vec<CaseReport>>
where
    R: Rng + ?Sized,
    W: Write + ?Sized,
{
    debug!(?config, "starting benchmark");
    let mut reports = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let report = run_strategy(config, strategy, rng, |_, _| {})?;
        write!(out, "{report}")?;
        out.flush()?;
        reports.push(report);
    }
    Ok(reports)
}
