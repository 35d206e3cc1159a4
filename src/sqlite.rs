//! SQLite implementation of [`PreparedBatch`].
//!
//! SQLite has neither session variables nor output parameters. Both are
//! emulated with a per-connection temporary table, `temp.batch_vars`, holding
//! one integer per name: batch text reads and writes it directly, and output
//! parameters are copied in before and read back after each execution.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, Statement};
use tracing::debug;

use crate::command::BatchCommand;
use crate::session::{PreparedBatch, ResultSet, Row};
use crate::{Error, Result};

const BATCH_VARS_DDL: &str =
    "CREATE TEMP TABLE IF NOT EXISTS batch_vars (var_name TEXT PRIMARY KEY, var_value INTEGER)";
const STORE_VAR: &str =
    "INSERT OR REPLACE INTO temp.batch_vars (var_name, var_value) VALUES (?1, ?2)";
const LOAD_VAR: &str = "SELECT var_value FROM temp.batch_vars WHERE var_name = ?1";

/// A single connection to an existing database file.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens `path` read-write. The file must already exist; nothing is
    /// created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Database> {
        let path = path.as_ref().to_path_buf();
        let connect = || -> rusqlite::Result<Connection> {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.execute_batch(BATCH_VARS_DDL)?;
            Ok(conn)
        };
        let conn = connect().map_err(|source| Error::Connect {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Ok(Database { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Compiles every statement of `command` and binds its parameters.
    pub fn prepare(&self, command: BatchCommand) -> Result<SqliteBatch<'_>> {
        let mut statements = Vec::with_capacity(command.statements().len());
        for sql in command.statements() {
            let mut stmt = self.conn.prepare(sql)?;
            let mut slots = Vec::new();
            for (param, parameter) in command.parameters().iter().enumerate() {
                if let Some(slot) = stmt.parameter_index(&parameter.placeholder())? {
                    stmt.raw_bind_parameter(slot, parameter.value)?;
                    slots.push((param, slot));
                }
            }
            let columns = stmt.column_count();
            statements.push(BatchStatement {
                stmt,
                columns,
                slots,
            });
        }
        debug!(
            strategy = %command.strategy(),
            statements = statements.len(),
            "prepared batch:\n{}",
            command.text()
        );
        Ok(SqliteBatch {
            command,
            statements,
            store_var: self.conn.prepare(STORE_VAR)?,
            load_var: self.conn.prepare(LOAD_VAR)?,
        })
    }
}

struct BatchStatement<'conn> {
    stmt: Statement<'conn>,
    /// Zero for statements that never produce rows.
    columns: usize,
    /// (index into the command's parameters, one-based bind slot)
    slots: Vec<(usize, usize)>,
}

/// A [`BatchCommand`] prepared against a [`Database`].
pub struct SqliteBatch<'conn> {
    command: BatchCommand,
    statements: Vec<BatchStatement<'conn>>,
    store_var: Statement<'conn>,
    load_var: Statement<'conn>,
}

fn read_row(row: &rusqlite::Row<'_>, columns: usize) -> rusqlite::Result<Row> {
    (0..columns).map(|i| row.get::<_, Option<i64>>(i)).collect()
}

impl<'conn> SqliteBatch<'conn> {
    fn store_outputs(&mut self) -> Result<()> {
        for parameter in self.command.parameters() {
            if !parameter.direction.is_output() {
                continue;
            }
            let value = if parameter.direction.is_input() {
                parameter.value
            } else {
                None
            };
            self.store_var.execute(params![parameter.name, value])?;
        }
        Ok(())
    }

    fn load_outputs(&mut self) -> Result<()> {
        for parameter in self.command.parameters_mut() {
            if parameter.direction.is_output() {
                parameter.value = self
                    .load_var
                    .query_row(params![parameter.name], |row| row.get(0))?;
            }
        }
        Ok(())
    }

    /// Runs the whole batch, handing the first row of the first result set to
    /// `read`. Later result sets are stepped through so their statements run.
    fn execute_first<T>(
        &mut self,
        read: impl Fn(&rusqlite::Row<'_>, usize) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        self.store_outputs()?;
        let mut first = None;
        let mut seen_rows = false;
        for statement in &mut self.statements {
            let columns = statement.columns;
            if columns == 0 {
                statement.stmt.raw_execute()?;
                continue;
            }
            let mut rows = statement.stmt.raw_query();
            if seen_rows {
                while rows.next()?.is_some() {}
            } else {
                seen_rows = true;
                first = rows.next()?.map(|row| read(row, columns)).transpose()?;
            }
        }
        self.load_outputs()?;
        Ok(first)
    }
}

impl<'conn> PreparedBatch for SqliteBatch<'conn> {
    fn command(&self) -> &BatchCommand {
        &self.command
    }

    fn execute_reader(&mut self) -> Result<Vec<ResultSet>> {
        self.store_outputs()?;
        let mut sets = Vec::new();
        for statement in &mut self.statements {
            let columns = statement.columns;
            if columns == 0 {
                statement.stmt.raw_execute()?;
                continue;
            }
            let mut rows = statement.stmt.raw_query();
            let first_row = rows.next()?.map(|row| read_row(row, columns)).transpose()?;
            while rows.next()?.is_some() {}
            sets.push(ResultSet { first_row });
        }
        self.load_outputs()?;
        Ok(sets)
    }

    fn execute_single_row(&mut self) -> Result<Option<Row>> {
        self.execute_first(read_row)
    }

    fn execute_scalar(&mut self) -> Result<Option<i64>> {
        Ok(self
            .execute_first(|row, _| row.get::<_, Option<i64>>(0))?
            .flatten())
    }

    fn execute_non_query(&mut self) -> Result<usize> {
        self.store_outputs()?;
        let mut changed = 0;
        for statement in &mut self.statements {
            if statement.columns == 0 {
                changed += statement.stmt.raw_execute()?;
            } else {
                let mut rows = statement.stmt.raw_query();
                while rows.next()?.is_some() {}
            }
        }
        self.load_outputs()?;
        Ok(changed)
    }

    fn set_parameter(&mut self, name: &str, value: Option<i64>) -> Result<()> {
        let param = self
            .command
            .parameters()
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))?;
        for statement in &mut self.statements {
            for &(bound, slot) in &statement.slots {
                if bound == param {
                    statement.stmt.raw_bind_parameter(slot, value)?;
                }
            }
        }
        self.command.parameters_mut()[param].value = value;
        Ok(())
    }
}
