//! Micro-benchmark of five ways to run a batch of SQL UPDATE statements and
//! find out how many rows each one affected.
//!
//! ```rust,no_run
//! use rand::SeedableRng;
//! use update_batching::{run_all, BenchConfig};
//!
//! fn main() -> update_batching::Result<()> {
//!     let mut rng = rand::rngs::StdRng::from_entropy();
//!     run_all(&BenchConfig::default(), &mut rng, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod driver;
mod error;
pub mod session;
pub mod sqlite;
pub mod timing;

pub use crate::command::{BatchCommand, Direction, Parameter, Strategy, ROWS_AFFECTED};
pub use crate::config::BenchConfig;
pub use crate::driver::{execute_once, run_all, run_case, run_strategy, CaseReport, Outcome};
pub use crate::error::{Error, Result};
pub use crate::session::{PreparedBatch, ResultSet, Row};
pub use crate::sqlite::{Database, SqliteBatch};
