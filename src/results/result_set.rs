use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// A result set from a database query
///
/// This struct represents the result of a database query,
/// containing the rows returned by the query and metadata.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// Rows returned, or the driver's row count for statements that return none
    pub rows_affected: usize,
    /// Column names shared by all rows (to avoid duplicating in each row)
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index: None,
        }
    }

    /// An empty result set carrying only the driver's affected-row count.
    #[must_use]
    pub fn from_changes(changes: u64) -> ResultSet {
        ResultSet {
            rows_affected: usize::try_from(changes).unwrap_or(usize::MAX),
            ..ResultSet::default()
        }
    }

    /// Build a result set from column names and row values in one go.
    ///
    /// ```rust
    /// use catalog_db::prelude::*;
    ///
    /// let rs = ResultSet::from_rows(vec!["id".into()], vec![vec![RowValues::Int(123)]]);
    /// assert_eq!(rs.first().and_then(|r| r.get("id")), Some(&RowValues::Int(123)));
    /// ```
    #[must_use]
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut result_set = ResultSet::with_capacity(rows.len());
        result_set.set_column_names(Arc::new(column_names));
        for row in rows {
            result_set.add_row_values(row);
        }
        result_set
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set. Rows added before column names are set are dropped.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        {
            self.results.push(CustomDbRow::with_index(
                column_names.clone(),
                column_index.clone(),
                row_values,
            ));
            self.rows_affected += 1;
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&CustomDbRow> {
        self.results.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the result set, keeping only the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<CustomDbRow> {
        self.results
    }
}
