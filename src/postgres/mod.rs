// PostgreSQL backend.
//
// - config: settings from the environment and pool construction
// - params: `RowValues` -> Postgres parameter conversion
// - query: row extraction and client-level helpers
// - executor: `SqlExecutor` / `ConnectionSource` for deadpool

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::DatabaseSettings;
pub use params::Params;
pub use query::{build_result_set_from_rows, postgres_extract_value};
