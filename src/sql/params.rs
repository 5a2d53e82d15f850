//! Bind values and their conversion to types that sqlx can bind.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{Database, Type, TypeInfo};
use std::str::FromStr;

/// One positional bind value. Serializes as the plain JSON scalar it carries.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Row identifier from the request path. Its column type is unknown, so
    /// backends without implicit text coercion bind it by shape.
    Key(String),
    Json(Value),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BindValue::Int(i),
                None => BindValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        }
    }

    /// Coerce a query-string value: canonical integers, decimals and booleans
    /// become typed scalars; everything else stays text. Only spellings that
    /// print back identically are coerced, so `007` and `2.50` stay text and
    /// nothing is lost when the value is later rendered for a text column.
    pub fn from_query_text(s: &str) -> Self {
        if let Ok(n) = s.parse::<i64>() {
            if n.to_string() == s {
                return BindValue::Int(n);
            }
        }
        if s.contains('.') {
            if let Ok(f) = s.parse::<f64>() {
                if f.is_finite() && f.to_string() == s {
                    return BindValue::Float(f);
                }
            }
        }
        match s {
            "true" => BindValue::Bool(true),
            "false" => BindValue::Bool(false),
            _ => BindValue::Text(s.to_string()),
        }
    }
}

/// A value encoded for one PostgreSQL parameter. Built against the type the
/// server reports for that parameter, so `"42"` can land in an INT4 column
/// and `5551234` in a TEXT one.
#[derive(Clone, Debug)]
pub enum PgBindValue {
    Null(Option<PgTypeInfo>),
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Numeric(BigDecimal),
    /// Sent as UTF-8 bytes: TEXT, VARCHAR, JSON, enums and the like.
    Text(String, Option<PgTypeInfo>),
    Uuid(uuid::Uuid),
    Json(Value),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Timestamptz(DateTime<Utc>),
}

impl PgBindValue {
    /// Without server type information: bind by the value's own shape.
    pub fn from_bind(v: &BindValue) -> Self {
        match v {
            BindValue::Null => PgBindValue::Null(None),
            BindValue::Bool(b) => PgBindValue::Bool(*b),
            BindValue::Int(n) => PgBindValue::I64(*n),
            BindValue::Float(f) => PgBindValue::F64(*f),
            BindValue::Text(s) => match uuid::Uuid::parse_str(s) {
                Ok(u) if s.len() == 36 => PgBindValue::Uuid(u),
                _ => PgBindValue::Text(s.clone(), None),
            },
            BindValue::Key(s) => {
                if let Ok(n) = s.parse::<i64>() {
                    PgBindValue::I64(n)
                } else if let Ok(u) = uuid::Uuid::parse_str(s) {
                    PgBindValue::Uuid(u)
                } else {
                    PgBindValue::Text(s.clone(), None)
                }
            }
            BindValue::Json(v) => PgBindValue::Json(v.clone()),
        }
    }

    /// Convert `v` to the parameter type `target`. The error names what was expected.
    pub fn for_target(v: &BindValue, target: &PgTypeInfo) -> Result<Self, String> {
        if let BindValue::Null = v {
            return Ok(PgBindValue::Null(Some(target.clone())));
        }
        let name = target.name();
        let expected = |what: &str| format!("expected {} for {}", what, name);
        Ok(match name {
            "INT2" => PgBindValue::I16(
                integer(v)
                    .and_then(|n| i16::try_from(n).ok())
                    .ok_or_else(|| expected("a small integer"))?,
            ),
            "INT4" => PgBindValue::I32(
                integer(v)
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| expected("an integer"))?,
            ),
            "INT8" => PgBindValue::I64(integer(v).ok_or_else(|| expected("an integer"))?),
            "FLOAT4" => PgBindValue::F32(float(v).ok_or_else(|| expected("a number"))? as f32),
            "FLOAT8" => PgBindValue::F64(float(v).ok_or_else(|| expected("a number"))?),
            "NUMERIC" => PgBindValue::Numeric(numeric(v).ok_or_else(|| expected("a number"))?),
            "BOOL" => PgBindValue::Bool(boolean(v).ok_or_else(|| expected("a boolean"))?),
            "UUID" => PgBindValue::Uuid(
                text(v)
                    .and_then(|s| uuid::Uuid::parse_str(s).ok())
                    .ok_or_else(|| expected("a uuid"))?,
            ),
            "JSONB" => PgBindValue::Json(json(v)),
            "JSON" => PgBindValue::Text(json(v).to_string(), Some(target.clone())),
            "BYTEA" => PgBindValue::Bytes(bytes(v).ok_or_else(|| expected("a byte array"))?),
            "DATE" => PgBindValue::Date(
                text(v)
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                    .ok_or_else(|| expected("a YYYY-MM-DD date"))?,
            ),
            "TIME" => PgBindValue::Time(text(v).and_then(parse_time).ok_or_else(|| expected("a time"))?),
            "TIMESTAMP" => PgBindValue::Timestamp(
                text(v)
                    .and_then(parse_naive_timestamp)
                    .ok_or_else(|| expected("a timestamp"))?,
            ),
            "TIMESTAMPTZ" => PgBindValue::Timestamptz(
                text(v)
                    .and_then(parse_timestamptz)
                    .ok_or_else(|| expected("a timestamp"))?,
            ),
            _ => PgBindValue::Text(plain_text(v), Some(target.clone())),
        })
    }
}

fn integer(v: &BindValue) -> Option<i64> {
    match v {
        BindValue::Int(n) => Some(*n),
        BindValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
        BindValue::Text(s) | BindValue::Key(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(v: &BindValue) -> Option<f64> {
    match v {
        BindValue::Int(n) => Some(*n as f64),
        BindValue::Float(f) => Some(*f),
        BindValue::Text(s) | BindValue::Key(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn numeric(v: &BindValue) -> Option<BigDecimal> {
    match v {
        BindValue::Int(n) => Some(BigDecimal::from(*n)),
        BindValue::Float(f) if f.is_finite() => BigDecimal::from_str(&f.to_string()).ok(),
        BindValue::Text(s) | BindValue::Key(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn boolean(v: &BindValue) -> Option<bool> {
    match v {
        BindValue::Bool(b) => Some(*b),
        BindValue::Int(0) => Some(false),
        BindValue::Int(1) => Some(true),
        BindValue::Text(s) | BindValue::Key(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" => Some(true),
            "false" | "f" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text(v: &BindValue) -> Option<&str> {
    match v {
        BindValue::Text(s) | BindValue::Key(s) => Some(s.trim()),
        _ => None,
    }
}

fn plain_text(v: &BindValue) -> String {
    match v {
        BindValue::Null => String::new(),
        BindValue::Bool(b) => b.to_string(),
        BindValue::Int(n) => n.to_string(),
        BindValue::Float(f) => f.to_string(),
        BindValue::Text(s) | BindValue::Key(s) => s.clone(),
        BindValue::Json(v) => v.to_string(),
    }
}

fn json(v: &BindValue) -> Value {
    match v {
        BindValue::Null => Value::Null,
        BindValue::Bool(b) => Value::Bool(*b),
        BindValue::Int(n) => Value::from(*n),
        BindValue::Float(f) => Value::from(*f),
        BindValue::Text(s) | BindValue::Key(s) => Value::String(s.clone()),
        BindValue::Json(v) => v.clone(),
    }
}

fn bytes(v: &BindValue) -> Option<Vec<u8>> {
    match v {
        BindValue::Text(s) | BindValue::Key(s) => Some(s.as_bytes().to_vec()),
        BindValue::Json(Value::Array(items)) => items
            .iter()
            .map(|i| i.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// `2024-01-02T03:04:05`, with a space instead of `T`, or a bare date at midnight.
fn parse_naive_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// RFC 3339; an offset-less timestamp is taken as UTC.
fn parse_timestamptz(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive_timestamp(s).map(|n| n.and_utc()))
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null(_) => IsNull::Yes,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I16(n) => <i16 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::I32(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F32(n) => <f32 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::Numeric(d) => <BigDecimal as Encode<Postgres>>::encode_by_ref(d, buf)?,
            PgBindValue::Text(s, _) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
            PgBindValue::Bytes(b) => <Vec<u8> as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
            PgBindValue::Time(t) => <NaiveTime as Encode<Postgres>>::encode_by_ref(t, buf)?,
            PgBindValue::Timestamp(t) => <NaiveDateTime as Encode<Postgres>>::encode_by_ref(t, buf)?,
            PgBindValue::Timestamptz(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf)?,
        })
    }

    /// Each variant declares its own wire type. A NULL with no known target
    /// goes out untyped so the server infers it from the column.
    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null(Some(ty)) | PgBindValue::Text(_, Some(ty)) => ty.clone(),
            PgBindValue::Null(None) => PgTypeInfo::with_oid(Oid(0)),
            PgBindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            PgBindValue::I16(_) => <i16 as Type<Postgres>>::type_info(),
            PgBindValue::I32(_) => <i32 as Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::F32(_) => <f32 as Type<Postgres>>::type_info(),
            PgBindValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            PgBindValue::Numeric(_) => <BigDecimal as Type<Postgres>>::type_info(),
            PgBindValue::Text(_, None) => <String as Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
            PgBindValue::Bytes(_) => <Vec<u8> as Type<Postgres>>::type_info(),
            PgBindValue::Date(_) => <NaiveDate as Type<Postgres>>::type_info(),
            PgBindValue::Time(_) => <NaiveTime as Type<Postgres>>::type_info(),
            PgBindValue::Timestamp(_) => <NaiveDateTime as Type<Postgres>>::type_info(),
            PgBindValue::Timestamptz(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind one value to a SQLite query. SQLite column affinity takes care of
/// text keys compared against INTEGER columns.
pub fn bind_sqlite<'q>(query: SqliteQuery<'q>, value: &BindValue) -> SqliteQuery<'q> {
    match value {
        BindValue::Null => query.bind(None::<String>),
        BindValue::Bool(b) => query.bind(*b),
        BindValue::Int(n) => query.bind(*n),
        BindValue::Float(f) => query.bind(*f),
        BindValue::Text(s) | BindValue::Key(s) => query.bind(s.clone()),
        BindValue::Json(v) => query.bind(v.to_string()),
    }
}
