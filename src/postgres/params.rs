use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, WrongType, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

/// Borrowed Postgres parameters for one statement.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    /// Convert from a slice of `RowValues` to Postgres parameters.
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let mut references = Vec::with_capacity(params.len());
        for p in params {
            references.push(p as &(dyn ToSql + Sync));
        }
        Params { references }
    }

    /// Get a reference to the underlying parameter array
    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

type ToSqlResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// Encode `value` only if its Rust type can represent the server-side type.
fn encode<T: ToSql>(value: &T, ty: &Type, out: &mut bytes::BytesMut) -> ToSqlResult {
    if !T::accepts(ty) {
        return Err(Box::new(WrongType::new::<T>(ty.clone())));
    }
    value.to_sql(ty, out)
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn parse_bool(s: &str) -> Result<bool, Box<dyn Error + Sync + Send>> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
        other => Err(format!("invalid boolean text {other:?}").into()),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
}

fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| parse_timestamp(s).map(|dt| dt.and_utc()))
}

impl ToSql for RowValues {
    // SQLite is loose about storage classes; the server picks the parameter type from
    // context, so values are narrowed, widened, printed or parsed to whatever it inferred.
    fn to_sql(&self, ty: &Type, out: &mut bytes::BytesMut) -> ToSqlResult {
        match self {
            RowValues::Int(i) => match *ty {
                Type::INT2 => encode(&i16::try_from(*i)?, ty, out),
                Type::INT4 => encode(&i32::try_from(*i)?, ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT4 => encode(&(*i as f32), ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT8 => encode(&(*i as f64), ty, out),
                Type::BOOL => encode(&(*i != 0), ty, out),
                _ if is_text(ty) => encode(&i.to_string(), ty, out),
                _ => encode(i, ty, out),
            },
            RowValues::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => encode(&(*f as f32), ty, out),
                _ if is_text(ty) => encode(&f.to_string(), ty, out),
                _ => encode(f, ty, out),
            },
            RowValues::Text(s) => match *ty {
                Type::INT2 => encode(&s.trim().parse::<i16>()?, ty, out),
                Type::INT4 => encode(&s.trim().parse::<i32>()?, ty, out),
                Type::INT8 => encode(&s.trim().parse::<i64>()?, ty, out),
                Type::FLOAT4 => encode(&s.trim().parse::<f32>()?, ty, out),
                Type::FLOAT8 => encode(&s.trim().parse::<f64>()?, ty, out),
                Type::BOOL => encode(&parse_bool(s)?, ty, out),
                Type::TIMESTAMP => encode(&parse_timestamp(s)?, ty, out),
                Type::TIMESTAMPTZ => encode(&parse_timestamptz(s)?, ty, out),
                Type::DATE => encode(&NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?, ty, out),
                _ => encode(s, ty, out),
            },
            RowValues::Bool(b) => match *ty {
                Type::INT2 => encode(&i16::from(*b), ty, out),
                Type::INT4 => encode(&i32::from(*b), ty, out),
                Type::INT8 => encode(&i64::from(*b), ty, out),
                _ if is_text(ty) => encode(&b.to_string(), ty, out),
                _ => encode(b, ty, out),
            },
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => encode(&dt.and_utc(), ty, out),
                Type::DATE => encode(&dt.date(), ty, out),
                _ => encode(dt, ty, out),
            },
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => encode(jsval, ty, out),
            RowValues::Blob(bytes) => encode(bytes, ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}
