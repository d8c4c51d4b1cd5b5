use std::borrow::Cow;

use crate::error::CatalogDbError;
use crate::facade::DialectOptions;
use crate::translation::{
    QueryOptions, Statement, StatementKind, TranslatedStatement, TranslationMode,
    translate_statement,
};
use crate::types::RowValues;

mod dml;
mod select;

/// Fluent builder for one statement against a pool or a transaction's connection.
///
/// ```rust,no_run
/// use catalog_db::prelude::*;
///
/// # async fn demo(db: &Database) -> Result<(), CatalogDbError> {
/// let params = [RowValues::Text("Dune".into())];
/// let books = db
///     .query("SELECT id, title FROM books WHERE title = ?")
///     .params(&params)
///     .all()
///     .await?;
/// # let _ = books;
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<'e, 'q, E: ?Sized> {
    pub(crate) executor: &'e E,
    pub(crate) dialect: &'e DialectOptions,
    pub(crate) sql: Cow<'q, str>,
    pub(crate) params: Cow<'q, [RowValues]>,
    pub(crate) kind: Option<StatementKind>,
    pub(crate) options: QueryOptions,
}

impl<'e, 'q, E: ?Sized> QueryBuilder<'e, 'q, E> {
    pub(crate) fn new(executor: &'e E, dialect: &'e DialectOptions, sql: &'q str) -> Self {
        Self {
            executor,
            dialect,
            sql: Cow::Borrowed(sql),
            params: Cow::Borrowed(&[]),
            kind: None,
            options: QueryOptions::default(),
        }
    }

    pub(crate) fn from_statement(
        executor: &'e E,
        dialect: &'e DialectOptions,
        statement: &'q Statement,
    ) -> Self {
        Self {
            executor,
            dialect,
            sql: Cow::Borrowed(statement.query.as_str()),
            params: Cow::Borrowed(statement.params.as_slice()),
            kind: Some(statement.kind),
            options: QueryOptions {
                auto_returning: statement.auto_returning,
                ..QueryOptions::default()
            },
        }
    }

    /// Provide parameters for this statement.
    #[must_use]
    pub fn params(mut self, params: &'q [RowValues]) -> Self {
        self.params = Cow::Borrowed(params);
        self
    }

    /// Override translation and `RETURNING` behavior using `QueryOptions`.
    #[must_use]
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Override translation mode directly.
    #[must_use]
    pub fn translation(mut self, translation: TranslationMode) -> Self {
        self.options.translation = translation;
        self
    }

    /// Declare the statement kind instead of classifying the text.
    #[must_use]
    pub fn kind(mut self, kind: StatementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Don't append `RETURNING <id>` to this insert.
    #[must_use]
    pub fn without_returning(mut self) -> Self {
        self.options.auto_returning = false;
        self
    }

    /// Translate for Postgres, refusing transaction control.
    pub(crate) fn prepare(&self) -> Result<TranslatedStatement<'_>, CatalogDbError> {
        let kind = self
            .kind
            .unwrap_or_else(|| StatementKind::classify(&self.sql));
        if kind.is_transaction_control() {
            return Err(CatalogDbError::TransactionError(format!(
                "{kind} is not allowed here; use Database::begin_transaction() or a Session"
            )));
        }

        let enabled = self.options.translation.resolve(self.dialect.translate);
        let returning = if self.options.auto_returning {
            self.dialect.returning_column.as_deref()
        } else {
            None
        };
        let translated = translate_statement(&self.sql, kind, returning, enabled);
        tracing::debug!(
            kind = %translated.kind,
            sql = %translated.text,
            params = self.params.len(),
            "executing statement"
        );
        Ok(translated)
    }
}
