use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use tokio_postgres::Client;
use tokio_postgres::types::Type;

use super::params::Params;
use crate::error::CatalogDbError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `CatalogDbError::PostgresError` if the column cannot be decoded.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValues, CatalogDbError> {
    let value = match *row.columns()[idx].type_() {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| RowValues::Float(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(RowValues::Float),
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(RowValues::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| RowValues::Timestamp(v.naive_utc())),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|v| RowValues::Timestamp(v.and_time(NaiveTime::MIN))),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx)?.map(RowValues::JSON),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(RowValues::Blob),
        // text, varchar, bpchar, name and anything else that decodes as a string
        _ => row.try_get::<_, Option<String>>(idx)?.map(RowValues::Text),
    };
    Ok(value.unwrap_or(RowValues::Null))
}

/// Build a result set from raw Postgres rows.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_rows(
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, CatalogDbError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let cols: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        result_set.set_column_names(Arc::new(cols));
    }

    for row in rows {
        let col_count = row.columns().len();
        let mut row_values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Run a row-returning statement on a client.
///
/// # Errors
/// Returns the driver error unchanged, or an extraction error.
pub async fn query_on_client(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, CatalogDbError> {
    let converted = Params::convert(params);
    let rows = client.query(query, converted.as_refs()).await?;
    build_result_set_from_rows(&rows)
}

/// Run a statement on a client and return the affected row count.
///
/// # Errors
/// Returns the driver error unchanged.
pub async fn execute_on_client(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<u64, CatalogDbError> {
    let converted = Params::convert(params);
    Ok(client.execute(query, converted.as_refs()).await?)
}

/// Run a parameterless script on a client.
///
/// # Errors
/// Returns the driver error unchanged.
pub async fn batch_on_client(client: &Client, sql: &str) -> Result<(), CatalogDbError> {
    client.batch_execute(sql).await?;
    Ok(())
}
