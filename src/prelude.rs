//! Convenient imports for common functionality.

pub use crate::error::CatalogDbError;
pub use crate::executor::{ConnectionSource, DedicatedConnection, SqlExecutor};
pub use crate::facade::{
    Database, DialectOptions, Session, Transaction, connect_database, connect_database_in,
};
pub use crate::postgres::DatabaseSettings;
pub use crate::query_builder::QueryBuilder;
pub use crate::results::{CustomDbRow, ResultSet, RunResult};
pub use crate::translation::{
    QueryOptions, Statement, StatementKind, TranslatedStatement, TranslationMode,
    translate_placeholders, translate_statement,
};
pub use crate::types::RowValues;
