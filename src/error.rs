//! Error types for sqlmux.

use thiserror::Error;

use crate::dialect::Dialect;

/// The main error type for sqlmux operations.
#[derive(Debug, Error)]
pub enum MuxError {
    /// No command text has been loaded before an execute or prepare.
    #[error("No command text has been set")]
    NoCommandText,

    /// Operation is not available for the session's dialect family.
    #[error("Command not allowed for dialect {dialect}: {operation}")]
    DialectUnsupported {
        operation: &'static str,
        dialect: Dialect,
    },

    /// Failed to open, configure, or close a connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure reported by the backend driver.
    #[error("Driver error: {0}")]
    Driver(String),

    /// A command failed, wrapped with the operation that issued it.
    #[error("Error executing {operation}: {source}")]
    Execution {
        operation: &'static str,
        #[source]
        source: Box<MuxError>,
    },

    /// A transaction phase (begin, commit, rollback) failed.
    #[error("Transaction {phase} error: {message}")]
    Transaction {
        phase: &'static str,
        message: String,
        #[source]
        source: Option<Box<MuxError>>,
    },

    /// A reader operation was attempted with no open reader.
    #[error("No reader is open on this session")]
    NoReader,

    /// A cell or scalar value could not be converted to the requested type.
    #[error("Cannot convert {found} value to {expected}")]
    Conversion {
        expected: &'static str,
        found: &'static str,
    },

    /// A result column was requested by a name the reader does not carry.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MuxError {
    /// Wrap a failure with the executing operation's name.
    pub fn execution(operation: &'static str, source: MuxError) -> Self {
        Self::Execution {
            operation,
            source: Box::new(source),
        }
    }

    /// Wrap a failure that occurred during a transaction phase.
    pub fn transaction(phase: &'static str, source: MuxError) -> Self {
        Self::Transaction {
            phase,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// A transaction phase rejected because of session state, with no
    /// underlying driver failure.
    pub fn transaction_state(phase: &'static str, message: impl Into<String>) -> Self {
        Self::Transaction {
            phase,
            message: message.into(),
            source: None,
        }
    }

    /// Create a dialect-gate error for an unsupported operation.
    pub fn unsupported(operation: &'static str, dialect: Dialect) -> Self {
        Self::DialectUnsupported { operation, dialect }
    }

    /// Create a conversion error from type names.
    pub fn conversion(expected: &'static str, found: &'static str) -> Self {
        Self::Conversion { expected, found }
    }
}

/// Result type alias for sqlmux operations.
pub type MuxResult<T> = Result<T, MuxError>;
