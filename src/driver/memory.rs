//! In-memory driver for tests and offline development.
//!
//! Executions consume a queue of scripted outcomes and everything the
//! session does (opens, closes, executes, transaction calls, cancels) is
//! recorded in a journal, so tests can assert both the produced SQL and
//! the connection choreography around it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{MuxError, MuxResult};
use crate::params::ParameterSet;
use crate::source::DataSource;
use crate::table::Table;
use crate::value::SqlValue;

use super::{Connection, Driver, Rows};

/// What one queued execution should produce.
#[derive(Debug, Clone)]
enum Scripted {
    Sets(Vec<Table>),
    Affected(u64),
    Scalar(SqlValue),
    Error(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    scripted: VecDeque<Scripted>,
    journal: Vec<String>,
    last_bindings: Vec<(String, SqlValue)>,
    fail_commit: bool,
    fail_rollback: bool,
}

/// Scriptable driver whose connections share one journal.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<MemoryState>>,
    explicit_types: bool,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver that reports ODBC-style positional binding.
    pub fn positional() -> Self {
        Self {
            explicit_types: true,
            ..Self::default()
        }
    }

    /// Queue one result set for the next rows execution.
    pub fn queue_table(&self, table: Table) -> &Self {
        self.lock().scripted.push_back(Scripted::Sets(vec![table]));
        self
    }

    /// Queue several result sets for one execution.
    pub fn queue_sets(&self, sets: Vec<Table>) -> &Self {
        self.lock().scripted.push_back(Scripted::Sets(sets));
        self
    }

    pub fn queue_affected(&self, rows: u64) -> &Self {
        self.lock().scripted.push_back(Scripted::Affected(rows));
        self
    }

    pub fn queue_scalar(&self, value: impl Into<SqlValue>) -> &Self {
        self.lock().scripted.push_back(Scripted::Scalar(value.into()));
        self
    }

    /// Fail the next execution with a driver error.
    pub fn queue_error(&self, message: impl Into<String>) -> &Self {
        self.lock().scripted.push_back(Scripted::Error(message.into()));
        self
    }

    /// Refuse the next commit.
    pub fn fail_commit(&self) -> &Self {
        self.lock().fail_commit = true;
        self
    }

    /// Refuse the next rollback.
    pub fn fail_rollback(&self) -> &Self {
        self.lock().fail_rollback = true;
        self
    }

    pub fn journal(&self) -> Vec<String> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Name/value pairs bound to the most recent execution.
    pub fn last_bindings(&self) -> Vec<(String, SqlValue)> {
        self.lock().last_bindings.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for MemoryDriver {
    fn create_connection(&self, source: &DataSource) -> MuxResult<Box<dyn Connection>> {
        let connection_string = source.connection_string()?;
        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
            connection_string,
            open: false,
        }))
    }

    fn requires_explicit_types(&self) -> bool {
        self.explicit_types
    }
}

struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
    connection_string: String,
    open: bool,
}

impl MemoryConnection {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_scripted(&self, op: &str, text: &str, params: &ParameterSet) -> MuxResult<Scripted> {
        if !self.open {
            return Err(MuxError::Connection("connection is not open".into()));
        }
        let mut state = self.lock();
        state.journal.push(format!("{op}: {text}"));
        state.last_bindings = params
            .iter()
            .map(|p| (p.name().to_string(), p.value().clone()))
            .collect();
        match state.scripted.pop_front() {
            Some(Scripted::Error(message)) => Err(MuxError::Driver(message)),
            Some(other) => Ok(other),
            None => Ok(Scripted::Sets(vec![Table::default()])),
        }
    }
}

impl Connection for MemoryConnection {
    fn open(&mut self) -> MuxResult<()> {
        if !self.open {
            self.open = true;
            let line = format!("open: {}", self.connection_string);
            self.lock().journal.push(line);
        }
        Ok(())
    }

    fn close(&mut self) -> MuxResult<()> {
        if self.open {
            self.open = false;
            self.lock().journal.push("close".into());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn set_connection_string(&mut self, connection_string: String) -> MuxResult<()> {
        if self.open {
            return Err(MuxError::Connection(
                "cannot change the connection string while open".into(),
            ));
        }
        self.connection_string = connection_string;
        Ok(())
    }

    fn execute_rows(&mut self, text: &str, params: &ParameterSet) -> MuxResult<Box<dyn Rows>> {
        let sets = match self.take_scripted("rows", text, params)? {
            Scripted::Sets(sets) => sets,
            Scripted::Scalar(value) => vec![Table::new(["value"]).with_row(vec![value])],
            _ => vec![Table::default()],
        };
        Ok(Box::new(MemoryRows::new(sets)))
    }

    fn execute_non_query(&mut self, text: &str, params: &ParameterSet) -> MuxResult<u64> {
        Ok(match self.take_scripted("non-query", text, params)? {
            Scripted::Affected(rows) => rows,
            _ => 0,
        })
    }

    fn execute_scalar(&mut self, text: &str, params: &ParameterSet) -> MuxResult<SqlValue> {
        Ok(match self.take_scripted("scalar", text, params)? {
            Scripted::Scalar(value) => value,
            Scripted::Sets(sets) => sets
                .first()
                .and_then(|t| t.rows.first())
                .and_then(|r| r.first())
                .cloned()
                .unwrap_or(SqlValue::Null),
            _ => SqlValue::Null,
        })
    }

    fn begin(&mut self) -> MuxResult<()> {
        if !self.open {
            return Err(MuxError::Connection("connection is not open".into()));
        }
        self.lock().journal.push("begin".into());
        Ok(())
    }

    fn commit(&mut self) -> MuxResult<()> {
        let mut state = self.lock();
        state.journal.push("commit".into());
        if state.fail_commit {
            state.fail_commit = false;
            return Err(MuxError::Driver("commit refused".into()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> MuxResult<()> {
        let mut state = self.lock();
        state.journal.push("rollback".into());
        if state.fail_rollback {
            state.fail_rollback = false;
            return Err(MuxError::Driver("rollback refused".into()));
        }
        Ok(())
    }

    fn cancel(&mut self) {
        self.lock().journal.push("cancel".into());
    }

    fn bulk_copy(
        &mut self,
        table: &str,
        data: &Table,
        mappings: &[(String, String)],
    ) -> MuxResult<u64> {
        if !self.open {
            return Err(MuxError::Connection("connection is not open".into()));
        }
        let line = format!(
            "bulk-copy: {table} rows={} mapped={}",
            data.len(),
            mappings.len()
        );
        self.lock().journal.push(line);
        Ok(data.len() as u64)
    }
}

struct MemoryRows {
    sets: VecDeque<Table>,
    columns: Vec<String>,
    rows: VecDeque<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
    closed: bool,
}

impl MemoryRows {
    fn new(sets: Vec<Table>) -> Self {
        let mut sets: VecDeque<Table> = sets.into();
        let first = sets.pop_front().unwrap_or_default();
        Self {
            sets,
            columns: first.columns,
            rows: first.rows.into(),
            current: None,
            closed: false,
        }
    }
}

impl Rows for MemoryRows {
    fn advance(&mut self) -> MuxResult<bool> {
        if self.closed {
            return Err(MuxError::Driver("rows handle is closed".into()));
        }
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn value(&self, index: usize) -> MuxResult<&SqlValue> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| MuxError::Driver("no current row".into()))?;
        row.get(index)
            .ok_or_else(|| MuxError::Driver(format!("no column at position {index}")))
    }

    fn next_result(&mut self) -> MuxResult<bool> {
        if self.closed {
            return Err(MuxError::Driver("rows handle is closed".into()));
        }
        match self.sets.pop_front() {
            Some(table) => {
                self.columns = table.columns;
                self.rows = table.rows.into();
                self.current = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn close(&mut self) -> MuxResult<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn source() -> DataSource {
        DataSource::new(Dialect::SqlServer, "db01", "Shop")
    }

    #[test]
    fn test_scripted_rows_walk() {
        let driver = MemoryDriver::new();
        driver.queue_table(
            Table::new(["n"])
                .with_row(vec![SqlValue::Int(1)])
                .with_row(vec![SqlValue::Int(2)]),
        );
        let mut conn = driver.create_connection(&source()).unwrap();
        conn.open().unwrap();
        let mut rows = conn
            .execute_rows("SELECT n FROM t", &ParameterSet::new(Dialect::SqlServer))
            .unwrap();
        assert!(rows.advance().unwrap());
        assert_eq!(rows.value(0).unwrap(), &SqlValue::Int(1));
        assert!(rows.advance().unwrap());
        assert!(!rows.advance().unwrap());
        assert!(!rows.next_result().unwrap());
    }

    #[test]
    fn test_closed_connection_refuses_execution() {
        let driver = MemoryDriver::new();
        let mut conn = driver.create_connection(&source()).unwrap();
        let err = conn
            .execute_non_query("UPDATE t SET x=1", &ParameterSet::new(Dialect::SqlServer))
            .unwrap_err();
        assert!(matches!(err, MuxError::Connection(_)));
    }

    #[test]
    fn test_journal_records_choreography() {
        let driver = MemoryDriver::new();
        driver.queue_affected(3);
        let mut conn = driver.create_connection(&source()).unwrap();
        conn.open().unwrap();
        let affected = conn
            .execute_non_query("DELETE FROM t", &ParameterSet::new(Dialect::SqlServer))
            .unwrap();
        conn.close().unwrap();
        assert_eq!(affected, 3);
        let journal = driver.journal();
        assert!(journal[0].starts_with("open: Data Source=db01;"));
        assert_eq!(journal[1], "non-query: DELETE FROM t");
        assert_eq!(journal[2], "close");
    }
}
