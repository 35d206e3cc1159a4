//! Compiled-in benchmark parameters.

use std::path::PathBuf;

/// Local database file every case connects to.
pub const DATABASE_PATH: &str = "fortunes.db";

/// Executions timed per case.
pub const ITERATIONS: u32 = 50_000;

/// UPDATE statements per batch. Each one consumes a value/id parameter pair.
pub const BATCH_PAIRS: usize = 10;

/// Upper bound (inclusive) of the random values and ids. Lower bound is 1.
pub const MAX_RANDOM: i64 = 10_000;

/// Parameters of one benchmark run.
///
/// The binary only ever uses [`BenchConfig::default`]; the `with_*` methods
/// exist so fixtures can shrink the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub database: PathBuf,
    pub iterations: u32,
    pub pairs: usize,
    pub max_random: i64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DATABASE_PATH),
            iterations: ITERATIONS,
            pairs: BATCH_PAIRS,
            max_random: MAX_RANDOM,
        }
    }
}

impl BenchConfig {
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_pairs(mut self, pairs: usize) -> Self {
        self.pairs = pairs;
        self
    }
}
