use crate::error::CatalogDbError;
use crate::executor::SqlExecutor;
use crate::results::RunResult;

use super::QueryBuilder;

impl<E: SqlExecutor + ?Sized> QueryBuilder<'_, '_, E> {
    /// Execute a statement for its side effects, SQLite `run` style.
    ///
    /// Inserts that carry a `RETURNING` column report its value as `last_id`.
    ///
    /// # Errors
    /// Returns `CatalogDbError::TransactionError` for `BEGIN`/`COMMIT`/`ROLLBACK`, or the
    /// driver error unchanged.
    pub async fn run(self) -> Result<RunResult, CatalogDbError> {
        let translated = self.prepare()?;
        let params = self.params.as_ref();

        match translated.returning {
            Some(ref column) => {
                let rows = self.executor.query(&translated.text, params).await?;
                Ok(RunResult::from_returning(&rows, column))
            }
            None => {
                let changes = self.executor.execute(&translated.text, params).await?;
                Ok(RunResult::from_changes(changes))
            }
        }
    }
}
