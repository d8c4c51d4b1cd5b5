use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};

use super::query::{batch_on_client, execute_on_client, query_on_client};
use crate::error::CatalogDbError;
use crate::executor::{ConnectionSource, DedicatedConnection, SqlExecutor};
use crate::results::ResultSet;
use crate::types::RowValues;

// Each pool-level call checks out its own connection and returns it when the call ends.
#[async_trait]
impl SqlExecutor for Pool {
    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, CatalogDbError> {
        let client = self.get().await?;
        query_on_client(&client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<u64, CatalogDbError> {
        let client = self.get().await?;
        execute_on_client(&client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> Result<(), CatalogDbError> {
        let client = self.get().await?;
        batch_on_client(&client, sql).await
    }
}

#[async_trait]
impl ConnectionSource for Pool {
    type Conn = Object;

    async fn connect(&self) -> Result<Object, CatalogDbError> {
        Ok(self.get().await?)
    }
}

#[async_trait]
impl SqlExecutor for Object {
    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, CatalogDbError> {
        query_on_client(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<u64, CatalogDbError> {
        execute_on_client(self, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> Result<(), CatalogDbError> {
        batch_on_client(self, sql).await
    }
}

impl DedicatedConnection for Object {
    fn discard(self) {
        // detach from the pool so a connection with an open transaction is never reused
        drop(Object::take(self));
    }
}
