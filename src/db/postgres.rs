//! PostgreSQL executor.

use crate::db::{ExecOutcome, StatementExecutor};
use crate::error::AppError;
use crate::sql::{Dialect, PgBindValue, QueryBuf};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::Value;
use std::str::FromStr;
use sqlx::postgres::{PgArguments, PgRow, PgTypeInfo};
use sqlx::{Either, Executor, PgPool, Postgres};

pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        PgExecutor { pool }
    }

    /// Encode every bind to the type the server infers for its placeholder.
    /// Falls back to the value's own shape when the server reports nothing.
    async fn binds(&self, q: &QueryBuf) -> Result<Vec<PgBindValue>, AppError> {
        if q.params.is_empty() {
            return Ok(Vec::new());
        }
        let described = (&self.pool).describe(&q.sql).await?;
        let targets: Vec<PgTypeInfo> = match described.parameters() {
            Some(Either::Left(types)) => types.to_vec(),
            _ => Vec::new(),
        };
        q.params
            .iter()
            .enumerate()
            .map(|(i, p)| match targets.get(i) {
                Some(ty) => PgBindValue::for_target(p, ty)
                    .map_err(|reason| AppError::Validation(format!("parameter ${}: {}", i + 1, reason))),
                None => Ok(PgBindValue::from_bind(p)),
            })
            .collect()
    }
}

fn build(q: &QueryBuf, binds: Vec<PgBindValue>) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    binds
        .into_iter()
        .fold(sqlx::query(&q.sql), |query, b| query.bind(b))
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        let binds = self.binds(q).await?;
        let rows = build(q, binds).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        let binds = self.binds(q).await?;
        let row = build(q, binds).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn execute(&self, q: &QueryBuf) -> Result<ExecOutcome, AppError> {
        let binds = self.binds(q).await?;
        let done = build(q, binds).execute(&self.pool).await?;
        Ok(ExecOutcome {
            rows_affected: done.rows_affected(),
            last_insert_id: None,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i));
    }
    Value::Object(map)
}

/// Try decoders from narrowest to widest; sqlx refuses any decoder whose
/// type is incompatible with the column, so the first hit is the right one.
fn cell_to_value(row: &PgRow, i: usize) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(i) {
        return float(n as f64);
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(i) {
        return float(n);
    }
    if let Ok(Some(d)) = row.try_get::<Option<BigDecimal>, _>(i) {
        return decimal(&d);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(i) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(i) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(i) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(i) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(t)) = row.try_get::<Option<chrono::NaiveTime>, _>(i) {
        return Value::String(t.format("%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(i) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(i) {
        return j;
    }
    if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(i) {
        return Value::Array(bytes.into_iter().map(Value::from).collect());
    }
    Value::Null
}

/// A JSON number when an f64 holds the exact value, a string otherwise.
fn decimal(d: &BigDecimal) -> Value {
    let exact = d.to_string().parse::<f64>().ok().filter(|f| {
        f.is_finite() && BigDecimal::from_str(&f.to_string()).map_or(false, |back| back == *d)
    });
    match exact.and_then(serde_json::Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(d.to_string()),
    }
}

fn float(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
