//! Common error types for the songbook service

use sqlx::error::ErrorKind;
use std::time::Duration;
use thiserror::Error;

/// Common result type for songbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the store, the core logic and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error not covered by a more specific variant
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Pool closed, pool acquire timed out, or the connection dropped
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store round trip exceeded the configured query timeout
    #[error("Store operation '{operation}' timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    /// Store rejected the row (empty required field, NOT NULL, UNIQUE)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter key outside the filterable field set
    #[error("Invalid filter field: {0}")]
    InvalidFilterField(String),

    /// Filter predicate with more than one `op:` separator
    #[error("Invalid predicate format for '{field}': {predicate}")]
    InvalidPredicateFormat { field: String, predicate: String },

    /// Filter predicate prefix that is not a known operator
    #[error("Unknown filter operator '{operator}' for '{field}'")]
    UnknownFilterOperator { field: String, operator: String },

    /// Sort key outside the sortable field set
    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    /// Couplet index past the end of the lyric text
    #[error("Couplet index {index} is out of range ({count} couplets)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Caller-side input problems; never worth retrying
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::InvalidFilterField(_)
                | Error::InvalidPredicateFormat { .. }
                | Error::UnknownFilterOperator { .. }
                | Error::InvalidSortField(_)
                | Error::IndexOutOfRange { .. }
        )
    }

    /// Transient store failures a caller may retry.
    /// Every store operation is a single statement, so a retry never
    /// half-applies a previous attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Timeout { .. })
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("no matching row".to_string()),
            sqlx::Error::PoolTimedOut => {
                Error::StoreUnavailable("timed out acquiring a connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                Error::StoreUnavailable("connection pool is closed".to_string())
            }
            sqlx::Error::Io(e) => Error::StoreUnavailable(e.to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::ForeignKeyViolation => {
                    Error::ConstraintViolation(db_err.message().to_string())
                }
                _ => Error::Database(sqlx::Error::Database(db_err)),
            },
            other => Error::Database(other),
        }
    }
}
