//! Database Error Types
//!
//! Errors raised while opening the database, applying the schema, and
//! running multi-statement transactions. Row-level query failures from the
//! store traits are reported through `anyhow` with context instead.

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to create tables or indexes
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when creating the database directory
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create the parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A transaction was rolled back
    #[error("Transaction rolled back: {context}")]
    TransactionFailed { context: String },

    /// A UNIQUE constraint rejected the write
    #[error("Duplicate value for unique column {table}.{column}")]
    UniqueViolation { table: String, column: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }

    /// Recognize SQLite's `UNIQUE constraint failed: table.column` message
    ///
    /// Returns `None` for every other failure. Composite constraints report
    /// only their first column.
    pub fn from_unique_violation(err: &libsql::Error) -> Option<Self> {
        let message = err.to_string();
        let (_, rest) = message.split_once("UNIQUE constraint failed: ")?;
        let first = rest.split([',', ' ', ')', '`']).next()?;
        let (table, column) = first.split_once('.')?;
        Some(Self::UniqueViolation {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}
