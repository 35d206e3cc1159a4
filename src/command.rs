//! Batched UPDATE commands and the strategies used to read their results.
//!
//! Every strategy shares the same skeleton: `pairs` statements of the form
//! `UPDATE world SET randomnumber = @pN WHERE id = @pN+1`, each followed by
//! whatever the strategy uses to observe the number of affected rows.

use std::fmt;

use rand::Rng;

/// Name of the accumulator parameter/variable used by the XOR strategies.
pub const ROWS_AFFECTED: &str = "rowsAffected";

/// How the results of a batch are retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `SELECT changes()` after every UPDATE, one result set each.
    MultipleReaders,
    /// XOR accumulator returned by one trailing SELECT, read as a row.
    SingleReader,
    /// Same text as [`Strategy::SingleReader`], read as a single value.
    ExecuteScalar,
    /// XOR accumulator zeroed in SQL and returned as an output parameter.
    NonQueryOutput,
    /// XOR accumulator passed in by the caller and returned in place.
    NonQueryInOut,
}

impl Strategy {
    /// Every strategy, in the order the benchmark runs them.
    pub const ALL: [Strategy; 5] = [
        Strategy::MultipleReaders,
        Strategy::SingleReader,
        Strategy::ExecuteScalar,
        Strategy::NonQueryOutput,
        Strategy::NonQueryInOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::MultipleReaders => "Multiple Readers",
            Strategy::SingleReader => "Single Reader",
            Strategy::ExecuteScalar => "Execute Scalar",
            Strategy::NonQueryOutput => "NonQuery (Out param)",
            Strategy::NonQueryInOut => "NonQuery (InOut param)",
        }
    }

    /// Direction of the accumulator parameter, if the strategy passes one.
    pub fn accumulator(self) -> Option<Direction> {
        match self {
            Strategy::NonQueryOutput => Some(Direction::Output),
            Strategy::NonQueryInOut => Some(Direction::InputOutput),
            _ => None,
        }
    }

    fn prologue(self) -> Option<String> {
        match self {
            Strategy::MultipleReaders | Strategy::NonQueryInOut => None,
            Strategy::SingleReader | Strategy::ExecuteScalar => Some(format!(
                "INSERT OR REPLACE INTO temp.batch_vars (var_name, var_value) VALUES ('{ROWS_AFFECTED}', 0);"
            )),
            Strategy::NonQueryOutput => Some(format!(
                "UPDATE temp.batch_vars SET var_value = 0 WHERE var_name = '{ROWS_AFFECTED}';"
            )),
        }
    }

    fn trailer(self, mask: i64) -> String {
        match self {
            Strategy::MultipleReaders => "SELECT changes();".to_string(),
            // SQLite has no XOR operator: (a | b) - (a & b) == a ^ b.
            _ => format!(
                "UPDATE temp.batch_vars \
                 SET var_value = (var_value | ({mask} * changes())) - (var_value & ({mask} * changes())) \
                 WHERE var_name = '{ROWS_AFFECTED}';"
            ),
        }
    }

    fn epilogue(self) -> Option<String> {
        match self {
            Strategy::SingleReader | Strategy::ExecuteScalar => Some(format!(
                "SELECT var_value FROM temp.batch_vars WHERE var_name = '{ROWS_AFFECTED}';"
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
    InputOutput,
}

impl Direction {
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input | Direction::InputOutput)
    }

    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::InputOutput)
    }
}

/// A named command parameter. In SQL text it is referenced as `@name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub direction: Direction,
    pub value: Option<i64>,
}

impl Parameter {
    pub fn input(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Input,
            value: Some(value),
        }
    }

    pub fn placeholder(&self) -> String {
        format!("@{}", self.name)
    }
}

/// SQL statements plus the parameters they reference.
#[derive(Debug, Clone)]
pub struct BatchCommand {
    strategy: Strategy,
    statements: Vec<String>,
    parameters: Vec<Parameter>,
}

impl BatchCommand {
    /// Builds the batch for `strategy` with `pairs` UPDATE statements.
    ///
    /// Values and ids are drawn once, uniformly from `1..=max_random`. The
    /// accumulator parameter, when the strategy has one, comes first.
    pub fn build<R: Rng + ?Sized>(
        strategy: Strategy,
        pairs: usize,
        max_random: i64,
        rng: &mut R,
    ) -> Self {
        let mut parameters = Vec::with_capacity(pairs * 2 + 1);
        if let Some(direction) = strategy.accumulator() {
            parameters.push(Parameter {
                name: ROWS_AFFECTED.to_string(),
                direction,
                value: None,
            });
        }

        let mut statements = Vec::with_capacity(pairs * 2 + 2);
        statements.extend(strategy.prologue());

        let mut mask: i64 = 1;
        for pair in 0..pairs {
            let value = Parameter::input(format!("p{}", pair * 2), rng.gen_range(1..=max_random));
            let id = Parameter::input(format!("p{}", pair * 2 + 1), rng.gen_range(1..=max_random));
            statements.push(format!(
                "UPDATE world SET randomnumber = {} WHERE id = {};",
                value.placeholder(),
                id.placeholder()
            ));
            statements.push(strategy.trailer(mask));
            parameters.push(value);
            parameters.push(id);
            mask <<= 1;
        }

        statements.extend(strategy.epilogue());

        Self {
            strategy,
            statements,
            parameters,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The whole batch, one statement per line.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for statement in &self.statements {
            text.push_str(statement);
            text.push('\n');
        }
        text
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }
}
