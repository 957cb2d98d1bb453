//! Sessions: command state, batching, transactions, and execution.
//!
//! A [`Session`] owns one driver connection plus everything staged against
//! it: the current command text, the bound parameters, the statement
//! batch, an open reader, and the transaction flag. Every execute follows
//! the same choreography: validate the text, open the connection, run the
//! command, close the connection unless something holds it open, then
//! report the rendered text to the diagnostic hub.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::warn;

use crate::batch::StatementBatch;
use crate::dialect::Dialect;
use crate::driver::{Connection, Driver, Rows};
use crate::error::{MuxError, MuxResult};
use crate::events::DiagnosticHub;
use crate::params::{Parameter, ParameterSet};
use crate::queries;
use crate::query::{Query, QueryCommand};
use crate::render;
use crate::rewrite::{replace_wildcards, rewrite_for_hana};
use crate::source::DataSource;
use crate::table::{DataSet, Table};
use crate::value::{FromSqlValue, SqlType, SqlValue};

/// Connection-string key that enables multiple active result sets.
const MARS_KEY: &str = "MultipleActiveResultSets";
/// The exact fragment appended to and removed from SQL Server strings.
const MARS_FRAGMENT: &str = ";MultipleActiveResultSets=True";

/// Cache of full-text probe results, keyed by connection string, shared
/// between a session and every session it spawns so the probe runs once
/// per server and catalog pair.
#[derive(Debug, Default)]
pub struct FullTextCache {
    entries: RwLock<HashMap<String, bool>>,
}

impl FullTextCache {
    fn get(&self, key: &str) -> Option<bool> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    fn put(&self, key: String, enabled: bool) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, enabled);
    }
}

/// One logical database session over a driver connection.
pub struct Session {
    source: DataSource,
    dialect: Dialect,
    driver: Arc<dyn Driver>,
    connection: Arc<Mutex<Box<dyn Connection>>>,
    events: Option<Arc<DiagnosticHub>>,
    command_text: String,
    validated: bool,
    params: ParameterSet,
    batch: StatementBatch,
    rows: Option<Box<dyn Rows>>,
    reader_columns: Option<Vec<String>>,
    transaction_open: bool,
    keep_open: bool,
    share_associated: bool,
    full_text: Arc<FullTextCache>,
}

impl Session {
    /// Open a session against `source` using `driver`. The connection is
    /// created up front but stays closed until the first execute.
    pub fn new(driver: Arc<dyn Driver>, source: DataSource) -> MuxResult<Self> {
        let dialect = source.dialect;
        let connection = driver.create_connection(&source)?;
        let explicit = dialect.is_block_dialect() && driver.requires_explicit_types();
        Ok(Self {
            dialect,
            connection: Arc::new(Mutex::new(connection)),
            events: None,
            command_text: String::new(),
            validated: false,
            params: ParameterSet::new(dialect).with_explicit_typing(explicit),
            batch: StatementBatch::new(),
            rows: None,
            reader_columns: None,
            transaction_open: false,
            keep_open: false,
            share_associated: false,
            full_text: Arc::new(FullTextCache::default()),
            driver,
            source,
        })
    }

    /// Attach a diagnostic hub. Executed and failed commands are reported
    /// to it with their rendered full text.
    pub fn with_events(mut self, events: Arc<DiagnosticHub>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn is_transaction_open(&self) -> bool {
        self.transaction_open
    }

    pub fn is_connection_open(&self) -> bool {
        self.conn().is_open()
    }

    pub fn keep_open(&self) -> bool {
        self.keep_open
    }

    /// Hold the connection open across executes. Turning the flag off
    /// immediately closes the connection when nothing else holds it.
    pub fn set_keep_open(&mut self, keep: bool) -> MuxResult<()> {
        self.keep_open = keep;
        if !keep {
            self.close_connection_if_allowed()?;
        }
        Ok(())
    }

    pub fn share_associated(&self) -> bool {
        self.share_associated
    }

    /// When set, SQL Server sessions spawned by [`Session::associated`]
    /// reuse this session's connection with MARS enabled instead of
    /// opening one of their own.
    pub fn set_share_associated(&mut self, share: bool) {
        self.share_associated = share;
    }

    /// Spawn a session on the same source. With connection sharing on,
    /// SQL Server children reuse this session's connection (appending the
    /// MARS fragment if it is missing); otherwise the child gets its own.
    pub fn associated(&self) -> MuxResult<Session> {
        let connection = if self.share_associated && self.dialect.is_sql_server_family() {
            {
                let mut conn = self.conn();
                let current = conn.connection_string().to_string();
                if !current.contains(MARS_KEY) {
                    conn.set_connection_string(format!("{current}{MARS_FRAGMENT}"))?;
                }
            }
            Arc::clone(&self.connection)
        } else {
            Arc::new(Mutex::new(self.driver.create_connection(&self.source)?))
        };
        Ok(self.build_child(connection))
    }

    /// Fresh session with its own connection and default flags.
    fn spawn_root(&self) -> MuxResult<Session> {
        let connection = Arc::new(Mutex::new(self.driver.create_connection(&self.source)?));
        let mut child = self.build_child(connection);
        child.share_associated = false;
        Ok(child)
    }

    fn build_child(&self, connection: Arc<Mutex<Box<dyn Connection>>>) -> Session {
        Session {
            source: self.source.clone(),
            dialect: self.dialect,
            driver: Arc::clone(&self.driver),
            connection,
            events: self.events.clone(),
            command_text: String::new(),
            validated: false,
            params: ParameterSet::new(self.dialect).with_explicit_typing(
                self.dialect.is_block_dialect() && self.driver.requires_explicit_types(),
            ),
            batch: StatementBatch::new(),
            rows: None,
            reader_columns: None,
            transaction_open: false,
            keep_open: false,
            share_associated: self.share_associated,
            full_text: Arc::clone(&self.full_text),
        }
    }

    // ----- command text -----

    /// Resolve `query` for this session's dialect and install the text.
    /// Returns the resolved text.
    pub fn load_query(&mut self, query: &Query) -> String {
        let text = query.text_for(self.dialect);
        self.reader_columns = None;
        self.set_command_text(text.clone());
        text
    }

    /// Install `text` as the command to execute. Any pending validation
    /// state is discarded; the next execute re-validates.
    pub fn set_command_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.command_text = text.into();
        self.validated = false;
        self
    }

    /// Substitute the literal marker `${name}` in the command text.
    pub fn add_literal(&mut self, name: &str, value: &str) -> &mut Self {
        let text = self.command_text.replace(&format!("${{{name}}}"), value);
        self.set_command_text(text);
        self
    }

    /// Swap `*` wildcards for SQL `%` in a search pattern.
    pub fn replace_wildcards(&self, pattern: &str) -> String {
        replace_wildcards(pattern)
    }

    /// The command text rendered as one runnable script, parameter
    /// declarations included. Empty when no text is set.
    pub fn full_command_text(&self) -> String {
        if self.command_text.is_empty() {
            return String::new();
        }
        render::full_command_text(&self.command_text, &self.params, self.dialect)
    }

    // ----- parameters -----

    pub fn add_parameter(&mut self, name: &str, value: impl Into<SqlValue>) -> &Parameter {
        self.params.bind(name, value)
    }

    pub fn add_parameter_typed(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
        sql_type: Option<SqlType>,
    ) -> &Parameter {
        self.params.bind_typed(name, value, sql_type)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    pub fn clear_parameters(&mut self) {
        self.params.clear();
    }

    /// Reorder the parameter collection to match first occurrence in the
    /// command text. Positional drivers bind in collection order, so call
    /// this after assembling text whose marker order differs from bind
    /// order.
    pub fn redistribute_parameters(&mut self) {
        if self.dialect.is_block_dialect() && !self.params.is_empty() {
            let text = self.command_text.clone();
            self.params.reorder_by_occurrence(&text);
        }
    }

    // ----- batching -----

    /// Resolve `query` for this dialect and append it to the batch. The
    /// text also becomes the current command, so executing without a
    /// prepare runs the last added statement alone.
    pub fn add_query(&mut self, query: &Query) -> String {
        let text = query.text_for(self.dialect);
        self.add_statement(text.clone());
        text
    }

    /// Append one statement to the batch and make it the current command.
    pub fn add_statement(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        self.batch.add(QueryCommand::new(self.dialect, text.clone()));
        self.set_command_text(text);
        self
    }

    /// Collapse the batched statements into one command text and install
    /// it. With nothing batched the current text is left untouched.
    /// Returns the text that will execute.
    pub fn prepare_command_text(&mut self) -> &str {
        if let Some(text) = self.batch.prepare(self.dialect, &mut self.params) {
            self.set_command_text(text);
        }
        &self.command_text
    }

    // ----- execution -----

    /// Run the current command and return the affected row count.
    pub fn execute_non_query(&mut self) -> MuxResult<u64> {
        self.validate()?;
        match self.try_non_query() {
            Ok(affected) => {
                self.notify_executed();
                Ok(affected)
            }
            Err(err) => Err(self.notify_failed("command", err)),
        }
    }

    fn try_non_query(&mut self) -> MuxResult<u64> {
        self.open_connection()?;
        let affected = self.conn().execute_non_query(&self.command_text, &self.params)?;
        self.close_connection_if_allowed()?;
        Ok(affected)
    }

    /// Run the current command and convert the first cell of the result.
    pub fn execute_scalar<T: FromSqlValue>(&mut self) -> MuxResult<T> {
        self.validate()?;
        match self.try_scalar() {
            Ok(value) => {
                self.notify_executed();
                Ok(value)
            }
            Err(err) => Err(self.notify_failed("scalar", err)),
        }
    }

    fn try_scalar<T: FromSqlValue>(&mut self) -> MuxResult<T> {
        self.open_connection()?;
        let value = self.conn().execute_scalar(&self.command_text, &self.params)?;
        // Convert before closing; a conversion failure leaves the
        // connection open, like any other mid-execute failure.
        let converted = T::from_sql(&value)?;
        self.close_connection_if_allowed()?;
        Ok(converted)
    }

    /// Run the current command and leave the reader open on the session.
    /// The connection stays open until [`Session::close_reader`].
    pub fn execute_reader(&mut self) -> MuxResult<()> {
        self.validate()?;
        match self.try_reader() {
            Ok(rows) => {
                self.rows = Some(rows);
                self.reader_columns = None;
                self.notify_executed();
                Ok(())
            }
            Err(err) => Err(self.notify_failed("reader", err)),
        }
    }

    fn try_reader(&mut self) -> MuxResult<Box<dyn Rows>> {
        self.open_connection()?;
        self.conn().execute_rows(&self.command_text, &self.params)
    }

    /// Advance the open reader to the next row.
    pub fn read_row(&mut self) -> MuxResult<bool> {
        self.rows.as_mut().ok_or(MuxError::NoReader)?.advance()
    }

    /// Read `column` from the current row, converted to `T`.
    pub fn reader_value<T: FromSqlValue>(&self, column: &str) -> MuxResult<T> {
        let rows = self.rows.as_ref().ok_or(MuxError::NoReader)?;
        let index = rows
            .columns()
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .ok_or_else(|| MuxError::UnknownColumn(column.to_string()))?;
        T::from_sql(rows.value(index)?)
    }

    /// Read `column` from the current row, falling back to `default` when
    /// the column is missing or the value does not convert.
    pub fn reader_value_or<T: FromSqlValue>(&mut self, column: &str, default: T) -> T {
        if !self.reader_has_column(column) {
            return default;
        }
        self.reader_value(column).unwrap_or(default)
    }

    /// Whether the open reader carries `column`. Column names are cached
    /// until the reader closes.
    pub fn reader_has_column(&mut self, column: &str) -> bool {
        self.reader_column_names()
            .iter()
            .any(|name| name.eq_ignore_ascii_case(column))
    }

    /// Column names of the open reader; empty with no reader open.
    pub fn reader_column_names(&mut self) -> &[String] {
        if self.reader_columns.is_none() {
            let columns = self
                .rows
                .as_ref()
                .map(|rows| rows.columns().to_vec())
                .unwrap_or_default();
            self.reader_columns = Some(columns);
        }
        match &self.reader_columns {
            Some(columns) => columns,
            None => &[],
        }
    }

    /// Close the open reader and release the connection if nothing holds
    /// it. A reader abandoned before its last row cancels the running
    /// command first so the close does not drain the remaining rows.
    pub fn close_reader(&mut self) -> MuxResult<()> {
        if let Some(mut rows) = self.rows.take() {
            if !rows.is_closed() {
                if rows.advance()? {
                    self.conn().cancel();
                }
                rows.close()?;
            }
        }
        self.reader_columns = None;
        self.close_connection_if_allowed()
    }

    /// Run the current command and materialize the first result set.
    pub fn execute_table(&mut self) -> MuxResult<Table> {
        self.validate()?;
        match self.try_table() {
            Ok(table) => {
                self.notify_executed();
                Ok(table)
            }
            Err(err) => Err(self.notify_failed("table", err)),
        }
    }

    fn try_table(&mut self) -> MuxResult<Table> {
        self.open_connection()?;
        let mut rows = self.conn().execute_rows(&self.command_text, &self.params)?;
        let table = materialize(rows.as_mut(), None)?;
        rows.close()?;
        self.close_connection_if_allowed()?;
        Ok(table)
    }

    /// Run the current command and materialize every result set. With a
    /// base `name`, tables are named `name`, `name1`, `name2`, and so on.
    pub fn execute_dataset(&mut self, name: Option<&str>) -> MuxResult<DataSet> {
        self.validate()?;
        match self.try_dataset(name) {
            Ok(set) => {
                self.notify_executed();
                Ok(set)
            }
            Err(err) => Err(self.notify_failed("dataset", err)),
        }
    }

    fn try_dataset(&mut self, name: Option<&str>) -> MuxResult<DataSet> {
        self.open_connection()?;
        let mut rows = self.conn().execute_rows(&self.command_text, &self.params)?;
        let mut set = DataSet::new();
        loop {
            let table_name = name.map(|base| {
                if set.is_empty() {
                    base.to_string()
                } else {
                    format!("{base}{}", set.len())
                }
            });
            set.push(materialize(rows.as_mut(), table_name)?);
            if !rows.next_result()? {
                break;
            }
        }
        rows.close()?;
        self.close_connection_if_allowed()?;
        Ok(set)
    }

    /// Stream `data` into `destination` (the table's own name when
    /// `None`). SQL Server family only; the connection is left open, as
    /// bulk loads usually run in series.
    pub fn bulk_copy(
        &mut self,
        destination: Option<&str>,
        data: &Table,
        mappings: &[(String, String)],
    ) -> MuxResult<u64> {
        if !self.dialect.is_sql_server_family() {
            return Err(MuxError::unsupported("bulk copy", self.dialect));
        }
        self.open_connection()
            .map_err(|err| MuxError::execution("bulk copy", err))?;
        let destination = match destination {
            Some(name) => name.to_string(),
            None => data.name.clone().unwrap_or_default(),
        };
        self.conn()
            .bulk_copy(&destination, data, mappings)
            .map_err(|err| MuxError::execution("bulk copy", err))
    }

    // ----- transactions -----

    /// Open a transaction on the session's connection, opening the
    /// connection first when needed.
    pub fn begin_transaction(&mut self) -> MuxResult<()> {
        let result = self.open_and_begin();
        self.transaction_open = result.is_ok();
        result.map_err(|err| MuxError::transaction("begin", err))
    }

    fn open_and_begin(&self) -> MuxResult<()> {
        let mut conn = self.conn();
        if !conn.is_open() {
            conn.open()?;
        }
        conn.begin()
    }

    /// Commit the open transaction. The transaction flag drops whether or
    /// not the driver commit succeeds; the connection stays open either
    /// way and closes on the next gated release.
    pub fn commit(&mut self) -> MuxResult<()> {
        if !self.transaction_open {
            return Err(MuxError::transaction_state("commit", "no transaction is open"));
        }
        self.transaction_open = false;
        self.conn()
            .commit()
            .map_err(|err| MuxError::transaction("commit", err))
    }

    /// Roll back the open transaction. Without one this is a no-op, so
    /// cleanup paths can call it unconditionally.
    pub fn rollback(&mut self) -> MuxResult<()> {
        if !self.transaction_open {
            return Ok(());
        }
        self.transaction_open = false;
        self.conn()
            .rollback()
            .map_err(|err| MuxError::transaction("rollback", err))
    }

    // ----- probes and catalog helpers -----

    /// Open-and-close probe reporting reachability as a boolean.
    pub fn test_connection(&mut self) -> bool {
        match self.verify_connection() {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!("connection probe failed: {err}");
                false
            }
        }
    }

    /// Open-and-close probe propagating the failure.
    pub fn verify_connection(&mut self) -> MuxResult<()> {
        let mut conn = self.conn();
        conn.open()?;
        conn.close()
    }

    /// Whether full-text search is installed and enabled for this
    /// session's catalog. Probed once per connection string and cached;
    /// sessions without a connection string report `false`.
    pub fn full_text_enabled(&mut self) -> MuxResult<bool> {
        let key = self.conn().connection_string().to_string();
        if key.is_empty() {
            return Ok(false);
        }
        if let Some(enabled) = self.full_text.get(&key) {
            return Ok(enabled);
        }
        let mut probe = self.associated()?;
        probe.load_query(&queries::full_text_installed());
        let enabled = probe.execute_scalar::<i64>()? == 1;
        self.full_text.put(key, enabled);
        Ok(enabled)
    }

    /// Names of the catalogs visible to the connected login.
    pub fn list_databases(&self) -> MuxResult<Vec<String>> {
        let mut probe = self.spawn_root()?;
        probe.load_query(&queries::list_databases());
        probe.execute_reader()?;
        let mut names = Vec::new();
        while probe.read_row()? {
            names.push(probe.reader_value::<String>("Name")?);
        }
        probe.close_reader()?;
        Ok(names)
    }

    /// The active HANA tenant database, or `None` under any other dialect
    /// or when the lookup fails.
    pub fn active_block_database(&self) -> Option<String> {
        if !self.dialect.is_block_dialect() {
            return None;
        }
        match self.try_active_block_database() {
            Ok(name) => Some(name),
            Err(err) => {
                warn!("active tenant lookup failed: {err}");
                None
            }
        }
    }

    fn try_active_block_database(&self) -> MuxResult<String> {
        let mut probe = self.spawn_root()?;
        probe.load_query(&queries::active_block_database());
        probe.execute_scalar::<String>()
    }

    // ----- lifecycle -----

    /// Close the reader and the connection unconditionally, ignoring the
    /// keep-open, transaction, and sharing gates. Shared connections are
    /// closed too, so only the session that owns the lifecycle should
    /// call this.
    pub fn close(&mut self) -> MuxResult<()> {
        if let Some(mut rows) = self.rows.take() {
            if !rows.is_closed() {
                rows.close()?;
            }
        }
        self.reader_columns = None;
        let mut conn = self.conn();
        if conn.is_open() {
            conn.close()?;
        }
        Ok(())
    }

    // ----- internals -----

    fn conn(&self) -> MutexGuard<'_, Box<dyn Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject empty command text, then run the one-time block-dialect
    /// adaptation of the current text.
    fn validate(&mut self) -> MuxResult<()> {
        if self.command_text.is_empty() {
            return Err(MuxError::NoCommandText);
        }
        self.validate_block_text();
        Ok(())
    }

    /// Adapt the current text for a block dialect, once per text: rewrite
    /// the T-SQL spellings, then swap named markers for `?` when the
    /// driver binds positionally. Replacement walks the collection in
    /// bind order, so parameters whose names prefix one another must be
    /// bound longest first.
    fn validate_block_text(&mut self) {
        if self.validated || !self.dialect.is_block_dialect() {
            return;
        }
        self.command_text = rewrite_for_hana(&self.command_text);
        if !self.params.is_empty() && self.driver.requires_explicit_types() {
            let names: Vec<String> = self.params.iter().map(|p| p.name().to_string()).collect();
            for name in names {
                self.command_text = self.command_text.replace(&name, "?");
            }
        }
        self.validated = true;
    }

    fn open_connection(&self) -> MuxResult<()> {
        let mut conn = self.conn();
        if conn.is_open() {
            return Ok(());
        }
        if self.dialect.is_sql_server_family() {
            let current = conn.connection_string().to_string();
            if self.share_associated && !current.contains(MARS_KEY) {
                conn.set_connection_string(format!("{current}{MARS_FRAGMENT}"))?;
            } else if !self.share_associated && current.contains(MARS_FRAGMENT) {
                conn.set_connection_string(current.replace(MARS_FRAGMENT, ""))?;
            }
        }
        conn.open()
    }

    /// Release the connection unless a transaction, the keep-open flag,
    /// or connection sharing holds it. Ends the batch accumulation cycle
    /// either way.
    fn close_connection_if_allowed(&mut self) -> MuxResult<()> {
        self.batch.reset();
        let mut conn = self.conn();
        if conn.is_open() && !self.transaction_open && !self.keep_open && !self.share_associated {
            conn.close()?;
        }
        Ok(())
    }

    fn notify_executed(&self) {
        if let Some(events) = &self.events {
            events.command_executed(self.full_command_text());
        }
    }

    fn notify_failed(&self, operation: &'static str, err: MuxError) -> MuxError {
        if let Some(events) = &self.events {
            events.command_failed(self.full_command_text(), &err);
        }
        MuxError::execution(operation, err)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut rows) = self.rows.take() {
            if !rows.is_closed() {
                if let Err(err) = rows.close() {
                    warn!("failed to close reader while dropping session: {err}");
                }
            }
        }
        // Another session still holds the connection; the last one out
        // closes it.
        if Arc::strong_count(&self.connection) > 1 {
            return;
        }
        let mut conn = self.conn();
        if conn.is_open() {
            if let Err(err) = conn.close() {
                warn!("failed to close connection while dropping session: {err}");
            }
        }
    }
}

fn materialize(rows: &mut dyn Rows, name: Option<String>) -> MuxResult<Table> {
    let mut table = Table::new(rows.columns().iter().cloned());
    if let Some(name) = name {
        table = table.with_name(name);
    }
    let width = table.columns.len();
    while rows.advance()? {
        let mut row = Vec::with_capacity(width);
        for index in 0..width {
            row.push(rows.value(index)?.clone());
        }
        table.push_row(row);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;
    use pretty_assertions::assert_eq;

    fn source(dialect: Dialect) -> DataSource {
        DataSource::new(dialect, "localhost", "Proof").with_credentials("sa", "pw")
    }

    fn session(dialect: Dialect) -> (Arc<MemoryDriver>, Session) {
        let driver = Arc::new(MemoryDriver::new());
        let session = Session::new(driver.clone(), source(dialect)).unwrap();
        (driver, session)
    }

    #[test]
    fn test_execute_requires_command_text() {
        let (_driver, mut session) = session(Dialect::SqlServer);
        assert!(matches!(
            session.execute_non_query(),
            Err(MuxError::NoCommandText)
        ));
    }

    #[test]
    fn test_non_query_opens_and_closes_around_the_call() {
        let (driver, mut session) = session(Dialect::SqlServer);
        driver.queue_affected(3);
        session.set_command_text("DELETE FROM t");
        assert_eq!(session.execute_non_query().unwrap(), 3);

        let journal = driver.journal();
        assert_eq!(journal.len(), 3);
        assert!(journal[0].starts_with("open: "));
        assert_eq!(journal[1], "non-query: DELETE FROM t");
        assert_eq!(journal[2], "close");
    }

    #[test]
    fn test_keep_open_holds_connection_between_executes() {
        let (driver, mut session) = session(Dialect::SqlServer);
        session.set_keep_open(true).unwrap();
        session.set_command_text("DELETE FROM t");
        session.execute_non_query().unwrap();
        session.execute_non_query().unwrap();
        assert!(session.is_connection_open());

        session.set_keep_open(false).unwrap();
        assert!(!session.is_connection_open());
        let journal = driver.journal();
        assert_eq!(
            journal.iter().filter(|line| *line == "close").count(),
            1
        );
        assert_eq!(
            journal.iter().filter(|line| line.starts_with("open:")).count(),
            1
        );
    }

    #[test]
    fn test_positional_driver_swaps_markers_once() {
        let driver = Arc::new(MemoryDriver::positional());
        let mut session = Session::new(driver.clone(), source(Dialect::Hana)).unwrap();
        session.set_command_text("UPDATE [t] SET x = ISNULL(@p1, 0)");
        session.add_parameter("p1", 5i32);
        session.execute_non_query().unwrap();
        session.execute_non_query().unwrap();

        let journal = driver.journal();
        let lines: Vec<&String> = journal
            .iter()
            .filter(|line| line.starts_with("non-query:"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(*lines[0], "non-query: UPDATE \"t\" SET x = IFNULL(?, 0)");
        assert_eq!(lines[0], lines[1]);
    }

    #[test]
    fn test_commit_without_transaction_is_a_state_error() {
        let (_driver, mut session) = session(Dialect::SqlServer);
        let err = session.commit().unwrap_err();
        assert_eq!(err.to_string(), "Transaction commit error: no transaction is open");
    }

    #[test]
    fn test_rollback_without_transaction_is_silent() {
        let (driver, mut session) = session(Dialect::SqlServer);
        session.rollback().unwrap();
        assert!(driver.journal().is_empty());
    }

    #[test]
    fn test_scalar_failure_leaves_connection_open() {
        let (_driver, mut session) = session(Dialect::SqlServer);
        session.set_command_text("SELECT name FROM t");
        // Null scalar cannot convert to String; the close step is skipped.
        let err = session.execute_scalar::<String>().unwrap_err();
        assert!(matches!(err, MuxError::Execution { operation: "scalar", .. }));
        assert!(session.is_connection_open());
    }
}
