use async_trait::async_trait;

use crate::error::CatalogDbError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Something that can run one already-translated statement.
///
/// Implemented by the shared pool (each call checks out its own connection), by a
/// dedicated pooled connection, and by the recording driver in `test_utils`.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a statement that produces rows (`SELECT`, `... RETURNING`).
    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, CatalogDbError>;

    /// Run a statement that produces only an affected-row count.
    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<u64, CatalogDbError>;

    /// Run a parameterless, possibly multi-statement script.
    async fn batch_execute(&self, sql: &str) -> Result<(), CatalogDbError>;
}

/// A pool that can hand out a connection reserved for one transaction.
#[async_trait]
pub trait ConnectionSource: SqlExecutor {
    type Conn: DedicatedConnection;

    async fn connect(&self) -> Result<Self::Conn, CatalogDbError>;
}

/// A connection checked out of a [`ConnectionSource`]. Dropping it returns it to the pool.
pub trait DedicatedConnection: SqlExecutor + Sized + 'static {
    /// Give the connection up without returning it to the pool, for sessions that may
    /// still have a transaction open on the server.
    fn discard(self) {
        drop(self);
    }
}
