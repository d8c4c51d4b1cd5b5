use super::{Database, Transaction};
use crate::error::CatalogDbError;
use crate::executor::ConnectionSource;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::translation::{Statement, StatementKind, begin_statement};
use crate::types::RowValues;

/// One logical flow of statements, where `BEGIN`, `COMMIT` and `ROLLBACK` can be sent as
/// ordinary SQL.
///
/// While a transaction is open every statement goes to its dedicated connection;
/// otherwise statements go to the pool. The `BEGIN` text is sent as written, so
/// `BEGIN ISOLATION LEVEL SERIALIZABLE` or `START TRANSACTION READ ONLY` take effect.
///
/// ```rust,no_run
/// use catalog_db::prelude::*;
///
/// # async fn demo(db: &Database) -> Result<(), CatalogDbError> {
/// let mut session = db.session();
/// session.run("BEGIN TRANSACTION", &[]).await?;
/// let book = session
///     .run("INSERT INTO books (title) VALUES (?)", &[RowValues::from("Dune")])
///     .await?;
/// session
///     .run(
///         "INSERT OR IGNORE INTO author_books (author_id, book_id, position) VALUES (?, ?, ?)",
///         &[RowValues::Int(1), book.last_id.into(), RowValues::Int(1)],
///     )
///     .await?;
/// session.run("COMMIT", &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct Session<'db, P: ConnectionSource> {
    db: &'db Database<P>,
    tx: Option<Transaction<P::Conn>>,
}

impl<'db, P: ConnectionSource> Session<'db, P> {
    pub(crate) fn new(db: &'db Database<P>) -> Self {
        Self { db, tx: None }
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// # Errors
    /// Returns `CatalogDbError::TransactionError` for `BEGIN` while a transaction is open,
    /// or `COMMIT`/`ROLLBACK` while none is; otherwise the driver error unchanged.
    pub async fn run(&mut self, sql: &str, params: &[RowValues]) -> Result<RunResult, CatalogDbError> {
        if self.control(StatementKind::classify(sql), sql).await? {
            return Ok(RunResult::default());
        }
        match self.tx.as_mut() {
            Some(tx) => tx.run(sql, params).await,
            None => self.db.run(sql, params).await,
        }
    }

    /// # Errors
    /// See [`Session::run`].
    pub async fn get(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, CatalogDbError> {
        if self.control(StatementKind::classify(sql), sql).await? {
            return Ok(None);
        }
        match self.tx.as_mut() {
            Some(tx) => tx.get(sql, params).await,
            None => self.db.get(sql, params).await,
        }
    }

    /// # Errors
    /// See [`Session::run`].
    pub async fn all(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<CustomDbRow>, CatalogDbError> {
        if self.control(StatementKind::classify(sql), sql).await? {
            return Ok(Vec::new());
        }
        match self.tx.as_mut() {
            Some(tx) => tx.all(sql, params).await,
            None => self.db.all(sql, params).await,
        }
    }

    /// # Errors
    /// See [`Session::run`].
    pub async fn execute(&mut self, statement: &Statement) -> Result<ResultSet, CatalogDbError> {
        if self.control(statement.kind, &statement.query).await? {
            return Ok(ResultSet::default());
        }
        match self.tx.as_mut() {
            Some(tx) => tx.execute(statement).await,
            None => self.db.execute(statement).await,
        }
    }

    /// Apply a transaction control statement. Returns `false` for anything else.
    async fn control(&mut self, kind: StatementKind, sql: &str) -> Result<bool, CatalogDbError> {
        match kind {
            StatementKind::Begin => {
                if self.tx.is_some() {
                    return Err(CatalogDbError::TransactionError(
                        "BEGIN while a transaction is already open on this session".into(),
                    ));
                }
                self.tx = Some(self.db.open_transaction(begin_statement(sql)).await?);
            }
            StatementKind::Commit | StatementKind::Rollback => {
                let tx = self.tx.take().ok_or_else(|| {
                    CatalogDbError::TransactionError(format!(
                        "{kind} without an open transaction on this session"
                    ))
                })?;
                if kind == StatementKind::Commit {
                    tx.commit().await?;
                } else {
                    tx.rollback().await?;
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}
