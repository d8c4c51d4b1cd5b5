use crate::error::CatalogDbError;
use crate::executor::SqlExecutor;

/// DDL for the catalog tables (`users`, `authors`, `books`, `author_books`).
pub const BOOTSTRAP_SQL: &str = include_str!("../sql/bootstrap.sql");

/// Create the catalog schema if it is missing. Safe to run any number of times.
///
/// # Errors
/// Returns the driver error unchanged.
pub async fn bootstrap_database<E: SqlExecutor + ?Sized>(executor: &E) -> Result<(), CatalogDbError> {
    executor.batch_execute(BOOTSTRAP_SQL).await?;
    tracing::info!("catalog schema bootstrapped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        let statements: Vec<&str> = BOOTSTRAP_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        assert!(statements.len() >= 4);
        for stmt in statements {
            let body: String = stmt
                .lines()
                .filter(|l| !l.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join(" ");
            assert!(body.contains("IF NOT EXISTS"), "{body}");
        }
    }
}
