use std::sync::Arc;

use super::DialectOptions;
use crate::error::CatalogDbError;
use crate::executor::DedicatedConnection;
use crate::query_builder::QueryBuilder;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::translation::Statement;
use crate::types::RowValues;

/// An open transaction bound to one dedicated connection.
///
/// Finish it with [`Transaction::commit`] or [`Transaction::rollback`]; both give the
/// connection back whether or not the final statement succeeds. A transaction dropped
/// while still open logs a warning and its connection is discarded instead of being
/// returned to the pool.
pub struct Transaction<C: DedicatedConnection> {
    conn: Option<C>,
    dialect: Arc<DialectOptions>,
}

impl<C: DedicatedConnection> Transaction<C> {
    pub(crate) async fn begin(
        conn: C,
        dialect: Arc<DialectOptions>,
        statement: &str,
    ) -> Result<Self, CatalogDbError> {
        // on failure `conn` is dropped here and goes back to the pool
        conn.batch_execute(statement).await?;
        tracing::debug!(statement, "transaction started");
        Ok(Self {
            conn: Some(conn),
            dialect,
        })
    }

    fn connection(&self) -> Result<&C, CatalogDbError> {
        self.conn
            .as_ref()
            .ok_or_else(|| CatalogDbError::TransactionError("transaction already finished".into()))
    }

    /// Start a statement on this transaction's connection.
    ///
    /// # Errors
    /// Returns `CatalogDbError::TransactionError` if the transaction has already finished.
    pub fn query<'q>(&self, sql: &'q str) -> Result<QueryBuilder<'_, 'q, C>, CatalogDbError> {
        Ok(QueryBuilder::new(self.connection()?, &self.dialect, sql))
    }

    /// # Errors
    /// Returns the driver error unchanged; the transaction stays open.
    pub async fn run(&mut self, sql: &str, params: &[RowValues]) -> Result<RunResult, CatalogDbError> {
        self.query(sql)?.params(params).run().await
    }

    /// # Errors
    /// Returns the driver error unchanged; the transaction stays open.
    pub async fn get(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, CatalogDbError> {
        self.query(sql)?.params(params).get().await
    }

    /// # Errors
    /// Returns the driver error unchanged; the transaction stays open.
    pub async fn all(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<CustomDbRow>, CatalogDbError> {
        self.query(sql)?.params(params).all().await
    }

    /// # Errors
    /// Returns the driver error unchanged; the transaction stays open.
    pub async fn execute(&mut self, statement: &Statement) -> Result<ResultSet, CatalogDbError> {
        let conn = self.connection()?;
        QueryBuilder::from_statement(conn, &self.dialect, statement)
            .select()
            .await
    }

    /// Commit and release the connection.
    ///
    /// # Errors
    /// Returns the driver error from `COMMIT`; the connection is released regardless.
    pub async fn commit(self) -> Result<(), CatalogDbError> {
        self.finish("COMMIT").await
    }

    /// Roll back and release the connection.
    ///
    /// # Errors
    /// Returns the driver error from `ROLLBACK`; the connection is released regardless.
    pub async fn rollback(self) -> Result<(), CatalogDbError> {
        self.finish("ROLLBACK").await
    }

    async fn finish(mut self, statement: &'static str) -> Result<(), CatalogDbError> {
        let conn = self.conn.take().ok_or_else(|| {
            CatalogDbError::TransactionError("transaction already finished".into())
        })?;
        let outcome = conn.batch_execute(statement).await;
        drop(conn);
        match &outcome {
            Ok(()) => tracing::debug!(statement, "transaction finished"),
            Err(e) => tracing::warn!(statement, error = %e, "transaction did not finish cleanly"),
        }
        outcome
    }
}

impl<C: DedicatedConnection> Drop for Transaction<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("transaction dropped without commit or rollback; discarding its connection");
            conn.discard();
        }
    }
}
