//! Backend driver seam.
//!
//! Everything below the session is synchronous and object-safe: a `Driver`
//! builds unopened `Connection`s for a data source, a connection executes
//! finalized text against its backend, and a `Rows` handle walks result
//! sets one row at a time. Real backends live out of tree; the in-memory
//! driver in [`memory`] backs the crate's own tests and offline use.

pub mod memory;

pub use memory::MemoryDriver;

use crate::error::MuxResult;
use crate::params::ParameterSet;
use crate::source::DataSource;
use crate::table::Table;
use crate::value::SqlValue;

/// Factory for connections to one kind of backend.
pub trait Driver: Send + Sync {
    /// Build an unopened connection for `source`. No I/O happens here.
    fn create_connection(&self, source: &DataSource) -> MuxResult<Box<dyn Connection>>;

    /// True for positional-style backends (ODBC) that need every parameter
    /// explicitly typed and `?` markers in the command text.
    fn requires_explicit_types(&self) -> bool {
        false
    }
}

/// One physical backend connection.
pub trait Connection: Send {
    fn open(&mut self) -> MuxResult<()>;
    fn close(&mut self) -> MuxResult<()>;
    fn is_open(&self) -> bool;

    fn connection_string(&self) -> &str;

    /// Swap the connection string; only legal while closed.
    fn set_connection_string(&mut self, connection_string: String) -> MuxResult<()>;

    fn execute_rows(&mut self, text: &str, params: &ParameterSet) -> MuxResult<Box<dyn Rows>>;
    fn execute_non_query(&mut self, text: &str, params: &ParameterSet) -> MuxResult<u64>;
    fn execute_scalar(&mut self, text: &str, params: &ParameterSet) -> MuxResult<SqlValue>;

    fn begin(&mut self) -> MuxResult<()>;
    fn commit(&mut self) -> MuxResult<()>;
    fn rollback(&mut self) -> MuxResult<()>;

    /// Best-effort cancellation of the command currently producing rows.
    fn cancel(&mut self);

    /// Server-side bulk load of `data` into `table`. `mappings` pairs
    /// source column names with destination column names.
    fn bulk_copy(&mut self, table: &str, data: &Table, mappings: &[(String, String)])
        -> MuxResult<u64>;
}

/// Incremental cursor over the result sets of one execution.
pub trait Rows: Send {
    /// Advance to the next row of the current result set; `false` once
    /// exhausted. Fails on a closed handle.
    fn advance(&mut self) -> MuxResult<bool>;

    /// Column names of the current result set.
    fn columns(&self) -> &[String];

    /// Cell of the current row by column position.
    fn value(&self, index: usize) -> MuxResult<&SqlValue>;

    /// Move to the next result set; `false` when none remain.
    fn next_result(&mut self) -> MuxResult<bool>;

    fn close(&mut self) -> MuxResult<()>;
    fn is_closed(&self) -> bool;
}
