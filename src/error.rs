use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Error)]
pub enum CatalogDbError {
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[error(transparent)]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),
}

impl CatalogDbError {
    /// The SQLSTATE reported by Postgres, if this is a server-side error.
    #[must_use]
    pub fn sql_state(&self) -> Option<&SqlState> {
        match self {
            CatalogDbError::PostgresError(err) => err.code(),
            _ => None,
        }
    }

    /// True for `23505 unique_violation`, the shape callers check after a duplicate
    /// email or ISBN insert. The error itself is passed through untouched.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.sql_state() == Some(&SqlState::UNIQUE_VIOLATION)
    }
}
