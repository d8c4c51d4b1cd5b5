use crate::error::CatalogDbError;
use crate::executor::SqlExecutor;
use crate::results::{CustomDbRow, ResultSet};

use super::QueryBuilder;

impl<E: SqlExecutor + ?Sized> QueryBuilder<'_, '_, E> {
    /// Execute and return the full result set.
    ///
    /// Writes without a `RETURNING` clause come back with no rows and the driver's
    /// row count in `rows_affected`.
    ///
    /// # Errors
    /// Returns `CatalogDbError::TransactionError` for `BEGIN`/`COMMIT`/`ROLLBACK`, or the
    /// driver error unchanged.
    pub async fn select(self) -> Result<ResultSet, CatalogDbError> {
        let translated = self.prepare()?;
        let params = self.params.as_ref();
        if translated.returns_rows() {
            return self.executor.query(&translated.text, params).await;
        }
        let changes = self.executor.execute(&translated.text, params).await?;
        Ok(ResultSet::from_changes(changes))
    }

    /// First row, or `None` when nothing matched.
    ///
    /// # Errors
    /// See [`QueryBuilder::select`].
    pub async fn get(self) -> Result<Option<CustomDbRow>, CatalogDbError> {
        Ok(self.select().await?.into_rows().into_iter().next())
    }

    /// Every row; empty when nothing matched.
    ///
    /// # Errors
    /// See [`QueryBuilder::select`].
    pub async fn all(self) -> Result<Vec<CustomDbRow>, CatalogDbError> {
        Ok(self.select().await?.into_rows())
    }
}
