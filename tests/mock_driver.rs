//! Driver behaviour against an in-memory stand-in that reports a fixed number
//! of affected rows for every `UPDATE world`.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use update_batching::{
    run_case, BatchCommand, Error, Outcome, PreparedBatch, ResultSet, Result, Row, Strategy,
    ROWS_AFFECTED,
};

struct MockBatch {
    command: BatchCommand,
    values: HashMap<String, Option<i64>>,
    rows_per_update: i64,
    /// Accumulator value handed in at the start of each execution.
    inputs_seen: Vec<Option<i64>>,
    executions: u32,
    fail_at: Option<u32>,
}

impl MockBatch {
    fn new(strategy: Strategy) -> Self {
        let command = BatchCommand::build(strategy, 10, 10_000, &mut StdRng::seed_from_u64(7));
        let values = command
            .parameters()
            .iter()
            .map(|p| (p.name.clone(), p.value))
            .collect();
        MockBatch {
            command,
            values,
            rows_per_update: 1,
            inputs_seen: Vec::new(),
            executions: 0,
            fail_at: None,
        }
    }

    /// Walks the statements, returning every result set produced.
    fn run(&mut self) -> Result<Vec<ResultSet>> {
        if self.fail_at == Some(self.executions) {
            return Err(Error::Backend("connection reset".to_string()));
        }
        self.executions += 1;

        let output = self
            .command
            .parameter(ROWS_AFFECTED)
            .map(|p| (p.direction.is_input(), p.direction.is_output()));
        let mut acc = match output {
            Some((true, _)) => self.values[ROWS_AFFECTED],
            _ => None,
        };
        self.inputs_seen.push(acc);

        let mut changes = 0;
        let mut mask = 1;
        let mut sets = Vec::new();
        for sql in self.command.statements() {
            if sql.starts_with("UPDATE world") {
                changes = self.rows_per_update;
            } else if sql.starts_with("SELECT changes()") {
                sets.push(ResultSet {
                    first_row: Some(vec![Some(changes)]),
                });
            } else if sql.starts_with("INSERT OR REPLACE") || sql.contains("SET var_value = 0") {
                acc = Some(0);
            } else if sql.starts_with("UPDATE temp.batch_vars") {
                acc = acc.map(|a| a ^ (mask * changes));
                mask <<= 1;
            } else if sql.starts_with("SELECT var_value") {
                sets.push(ResultSet {
                    first_row: Some(vec![acc]),
                });
            }
        }

        if let Some((_, true)) = output {
            self.values.insert(ROWS_AFFECTED.to_string(), acc);
        }
        Ok(sets)
    }
}

impl PreparedBatch for MockBatch {
    fn command(&self) -> &BatchCommand {
        &self.command
    }

    fn execute_reader(&mut self) -> Result<Vec<ResultSet>> {
        self.run()
    }

    fn execute_single_row(&mut self) -> Result<Option<Row>> {
        Ok(self.run()?.into_iter().next().and_then(|set| set.first_row))
    }

    fn execute_scalar(&mut self) -> Result<Option<i64>> {
        Ok(self.run()?.first().and_then(ResultSet::value))
    }

    fn execute_non_query(&mut self) -> Result<usize> {
        self.run()?;
        Ok(10 * self.rows_per_update as usize)
    }

    fn set_parameter(&mut self, name: &str, value: Option<i64>) -> Result<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::UnknownParameter(name.to_string())),
        }
    }

    fn parameter(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied().flatten()
    }
}

fn run(batch: &mut MockBatch, iterations: u32) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    let report = run_case(batch, iterations, |i, outcome| {
        assert_eq!(i as usize, outcomes.len());
        outcomes.push(outcome.clone());
    })
    .unwrap();
    assert_eq!(report.iterations, iterations);
    assert_eq!(
        report.average_ticks(),
        report.total_ticks as f64 / f64::from(iterations)
    );
    outcomes
}

#[test]
fn multiple_readers_yield_one_row_count_per_pair() {
    let mut batch = MockBatch::new(Strategy::MultipleReaders);
    let outcomes = run(&mut batch, 3);
    assert_eq!(outcomes.len(), 3);
    for outcome in outcomes {
        match outcome {
            Outcome::ResultSets(sets) => {
                assert_eq!(sets.len(), 10);
                assert!(sets.iter().all(|set| set.value() == Some(1)));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

#[test]
fn accumulator_strategies_report_all_bits() {
    for strategy in [
        Strategy::SingleReader,
        Strategy::ExecuteScalar,
        Strategy::NonQueryOutput,
        Strategy::NonQueryInOut,
    ] {
        let mut batch = MockBatch::new(strategy);
        let outcomes = run(&mut batch, 3);
        let values: Vec<_> = outcomes.iter().map(Outcome::accumulator).collect();
        assert_eq!(values, [Some(1023); 3], "{strategy}");
    }
}

#[test]
fn in_out_accumulator_is_reset_before_every_execution() {
    let mut batch = MockBatch::new(Strategy::NonQueryInOut);
    run(&mut batch, 3);
    assert_eq!(batch.inputs_seen, [Some(0); 3]);
    assert_eq!(batch.parameter(ROWS_AFFECTED), Some(1023));

    // Executing again without the driver's reset carries the old value in.
    batch.execute_non_query().unwrap();
    assert_eq!(batch.inputs_seen.last(), Some(&Some(1023)));
    assert_eq!(batch.parameter(ROWS_AFFECTED), Some(0));
}

#[test]
fn output_accumulator_is_not_an_input() {
    let mut batch = MockBatch::new(Strategy::NonQueryOutput);
    batch.set_parameter(ROWS_AFFECTED, Some(5)).unwrap();
    run(&mut batch, 2);
    assert_eq!(batch.inputs_seen, [None, None]);
}

#[test]
fn missed_updates_clear_their_bits() {
    let mut batch = MockBatch::new(Strategy::ExecuteScalar);
    batch.rows_per_update = 0;
    let outcomes = run(&mut batch, 1);
    assert_eq!(outcomes[0], Outcome::Scalar(Some(0)));
}

#[test]
fn failure_names_case_and_iteration() {
    let mut batch = MockBatch::new(Strategy::SingleReader);
    batch.fail_at = Some(2);
    let mut observed = Vec::new();
    let err = run_case(&mut batch, 5, |i, _| observed.push(i)).unwrap_err();
    assert_eq!(observed, [0, 1]);
    match &err {
        Error::Case {
            case, iteration, ..
        } => {
            assert_eq!(*case, "Single Reader");
            assert_eq!(*iteration, Some(2));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(matches!(err.root(), Error::Backend(_)));
    assert_eq!(err.to_string(), "case `Single Reader` failed at iteration 2");
}

#[test]
fn zero_iterations() {
    let mut batch = MockBatch::new(Strategy::ExecuteScalar);
    let report = run_case(&mut batch, 0, |_, _| panic!("no iterations expected")).unwrap();
    assert_eq!(report.total_ticks, 0);
    assert_eq!(report.average_ticks(), 0.0);
    assert_eq!(batch.executions, 0);
}
