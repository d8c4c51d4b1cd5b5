use serde::Serialize;

use super::ResultSet;
use crate::types::RowValues;

/// Outcome of a mutating statement, shaped like SQLite's `this.lastID` / `this.changes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Generated key of the inserted row, when the statement returned one.
    pub last_id: Option<i64>,
    /// Rows inserted, updated or deleted.
    pub changes: u64,
}

impl RunResult {
    #[must_use]
    pub fn from_changes(changes: u64) -> Self {
        Self {
            last_id: None,
            changes,
        }
    }

    /// Build from the rows of an `INSERT ... RETURNING`, reading the key from `id_column`.
    #[must_use]
    pub fn from_returning(rows: &ResultSet, id_column: &str) -> Self {
        let last_id = rows
            .first()
            .and_then(|row| row.get(id_column))
            .and_then(RowValues::as_int)
            .copied();
        Self {
            last_id,
            changes: rows.rows_affected as u64,
        }
    }
}
