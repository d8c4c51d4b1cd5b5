//! SQLite-flavored query access (`run`, `get`, `all`, `?` placeholders, `last_id`) over
//! pooled async Postgres.
//!
//! Statements are written the way SQLite expects them and rewritten per call: `?` becomes
//! `$N`, `INSERT OR IGNORE` becomes `ON CONFLICT DO NOTHING`, and plain inserts get
//! `RETURNING id` so [`RunResult::last_id`] can be filled in.
//!
//! ```rust,no_run
//! use catalog_db::prelude::*;
//!
//! # async fn demo() -> Result<(), CatalogDbError> {
//! let db = connect_database().await?;
//! let user = db.get("SELECT * FROM users WHERE id = ?", &[RowValues::Int(1)]).await?;
//!
//! let mut tx = db.begin_transaction().await?;
//! let book = tx.run("INSERT INTO books (title) VALUES (?)", &["Dune".into()]).await?;
//! tx.run(
//!     "INSERT OR IGNORE INTO author_books (author_id, book_id, position) VALUES (?, ?, ?)",
//!     &[RowValues::Int(1), book.last_id.into(), RowValues::Int(1)],
//! )
//! .await?;
//! tx.commit().await?;
//! # let _ = user;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod error;
pub mod executor;
pub mod facade;
pub mod postgres;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::CatalogDbError;
pub use facade::{Database, connect_database};
pub use results::{CustomDbRow, ResultSet, RunResult};
pub use types::RowValues;
