//! The SQLite-flavored entry point: `run`, `get`, `all` and transactions over a pool.

use std::future::Future;
use std::sync::Arc;

use deadpool_postgres::Pool;
use tokio::sync::OnceCell;

use crate::bootstrap::bootstrap_database;
use crate::error::CatalogDbError;
use crate::executor::ConnectionSource;
use crate::postgres::DatabaseSettings;
use crate::query_builder::QueryBuilder;
use crate::results::{CustomDbRow, ResultSet, RunResult};
use crate::translation::Statement;
use crate::types::RowValues;

mod session;
mod transaction;

pub use session::Session;
pub use transaction::Transaction;

/// Dialect rules shared by a database and the transactions it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectOptions {
    /// Default for `?` -> `$N` translation.
    pub translate: bool,
    /// Column appended as `RETURNING <column>` to plain inserts; `None` turns it off.
    pub returning_column: Option<String>,
}

impl Default for DialectOptions {
    fn default() -> Self {
        Self {
            translate: true,
            returning_column: Some("id".to_string()),
        }
    }
}

/// Query facade over a connection source (a deadpool `Pool` in production).
pub struct Database<P = Pool> {
    source: P,
    dialect: Arc<DialectOptions>,
    auto_bootstrap: bool,
    bootstrapped: OnceCell<()>,
}

impl Database<Pool> {
    /// Build the pool described by `settings`. No connection is opened yet.
    ///
    /// # Errors
    /// Returns `CatalogDbError::ConfigError` or `CatalogDbError::ConnectionError` if the pool
    /// cannot be created.
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, CatalogDbError> {
        let pool = settings.create_pool()?;
        Ok(Self::with_source(pool)
            .with_dialect(DialectOptions {
                translate: settings.translate_placeholders,
                ..DialectOptions::default()
            })
            .with_auto_bootstrap(settings.auto_bootstrap))
    }
}

impl<P: ConnectionSource> Database<P> {
    pub fn with_source(source: P) -> Self {
        Self {
            source,
            dialect: Arc::new(DialectOptions::default()),
            auto_bootstrap: true,
            bootstrapped: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: DialectOptions) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    #[must_use]
    pub fn with_auto_bootstrap(mut self, auto_bootstrap: bool) -> Self {
        self.auto_bootstrap = auto_bootstrap;
        self
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn dialect(&self) -> &DialectOptions {
        &self.dialect
    }

    /// Start a statement on the pool; each execution checks out its own connection.
    pub fn query<'q>(&self, sql: &'q str) -> QueryBuilder<'_, 'q, P> {
        QueryBuilder::new(&self.source, &self.dialect, sql)
    }

    /// Execute a statement for its effect. Plain inserts report the new row's id.
    ///
    /// ```rust,no_run
    /// use catalog_db::prelude::*;
    ///
    /// # async fn demo(db: &Database) -> Result<(), CatalogDbError> {
    /// let params = [
    ///     RowValues::from("Ann"),
    ///     RowValues::from("ann@example.com"),
    ///     RowValues::from("hash"),
    /// ];
    /// let result = db
    ///     .run("INSERT INTO users (name, email, password) VALUES (?, ?, ?)", &params)
    ///     .await?;
    /// println!("new user {:?}, {} row(s)", result.last_id, result.changes);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns the driver error unchanged. `BEGIN`/`COMMIT`/`ROLLBACK` are refused with
    /// `CatalogDbError::TransactionError`; use [`Database::begin_transaction`] or
    /// [`Database::session`] instead.
    pub async fn run(&self, sql: &str, params: &[RowValues]) -> Result<RunResult, CatalogDbError> {
        self.query(sql).params(params).run().await
    }

    /// First matching row, if any.
    ///
    /// # Errors
    /// Same as [`Database::run`].
    pub async fn get(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, CatalogDbError> {
        self.query(sql).params(params).get().await
    }

    /// Every matching row; empty when nothing matched.
    ///
    /// # Errors
    /// Same as [`Database::run`].
    pub async fn all(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<CustomDbRow>, CatalogDbError> {
        self.query(sql).params(params).all().await
    }

    /// Execute a structured statement and return its full result set.
    ///
    /// # Errors
    /// Same as [`Database::run`].
    pub async fn execute(&self, statement: &Statement) -> Result<ResultSet, CatalogDbError> {
        QueryBuilder::from_statement(&self.source, &self.dialect, statement)
            .select()
            .await
    }

    /// Run a multi-statement script verbatim, without translation or parameters.
    ///
    /// # Errors
    /// Returns the driver error unchanged.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), CatalogDbError> {
        self.source.batch_execute(sql).await
    }

    /// Check out a dedicated connection and open a transaction on it.
    ///
    /// # Errors
    /// Returns the pool or driver error if no connection is available or `BEGIN` fails.
    pub async fn begin_transaction(&self) -> Result<Transaction<P::Conn>, CatalogDbError> {
        self.open_transaction("BEGIN").await
    }

    /// Check out a connection and open a transaction with the given `BEGIN` text.
    pub(crate) async fn open_transaction(
        &self,
        statement: &str,
    ) -> Result<Transaction<P::Conn>, CatalogDbError> {
        let conn = self.source.connect().await?;
        Transaction::begin(conn, Arc::clone(&self.dialect), statement).await
    }

    /// A per-flow handle that accepts `BEGIN`/`COMMIT`/`ROLLBACK` as plain statements.
    pub fn session(&self) -> Session<'_, P> {
        Session::new(self)
    }

    /// Create the catalog schema. Safe to repeat.
    ///
    /// # Errors
    /// Returns the driver error unchanged.
    pub async fn bootstrap(&self) -> Result<(), CatalogDbError> {
        bootstrap_database(&self.source).await
    }

    /// Run [`Database::bootstrap`] once for this handle if auto-bootstrap is on.
    ///
    /// # Errors
    /// Returns the bootstrap error; a later call retries.
    pub async fn ensure_bootstrapped(&self) -> Result<(), CatalogDbError> {
        if !self.auto_bootstrap {
            return Ok(());
        }
        self.bootstrapped
            .get_or_try_init(|| self.bootstrap())
            .await
            .map(|_| ())
    }
}

/// Initialize a database in `cell` at most once, bootstrapping it on the way.
///
/// Concurrent and repeated callers all get the same handle. A failed initialization
/// leaves the cell empty so the next call tries again.
///
/// # Errors
/// Returns the error from `make` or from bootstrapping.
pub async fn connect_database_in<P, F, Fut>(
    cell: &OnceCell<Database<P>>,
    make: F,
) -> Result<&Database<P>, CatalogDbError>
where
    P: ConnectionSource,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Database<P>, CatalogDbError>>,
{
    cell.get_or_try_init(|| async {
        let db = make().await?;
        db.ensure_bootstrapped().await?;
        tracing::info!(
            translate = db.dialect.translate,
            auto_bootstrap = db.auto_bootstrap,
            "database ready"
        );
        Ok(db)
    })
    .await
}

static DATABASE: OnceCell<Database> = OnceCell::const_new();

/// The process-wide database, configured from the environment on first use.
///
/// # Errors
/// Returns `CatalogDbError::ConfigError` for bad settings, or the bootstrap error.
pub async fn connect_database() -> Result<&'static Database, CatalogDbError> {
    connect_database_in(&DATABASE, || async {
        let settings = DatabaseSettings::from_env()?;
        Database::connect(&settings)
    })
    .await
}
