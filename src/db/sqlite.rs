//! SQLite executor.

use crate::db::{ExecOutcome, StatementExecutor};
use crate::error::AppError;
use crate::sql::{bind_sqlite, Dialect, QueryBuf, SqliteQuery};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteExecutor { pool }
    }
}

fn build(q: &QueryBuf) -> SqliteQuery<'_> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let query: SqliteQuery<'_> = sqlx::query(&q.sql);
    q.params.iter().fold(query, bind_sqlite)
}

#[async_trait]
impl StatementExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        let rows = build(q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        let row = build(q).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_json).transpose()
    }

    async fn execute(&self, q: &QueryBuf) -> Result<ExecOutcome, AppError> {
        let done = build(q).execute(&self.pool).await?;
        Ok(ExecOutcome {
            rows_affected: done.rows_affected(),
            last_insert_id: Some(done.last_insert_rowid()),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQLite values carry their own storage class, so decode by that rather
/// than by the declared column type.
fn row_to_json(row: &SqliteRow) -> Result<Value, AppError> {
    use sqlx::{Column, Row, TypeInfo, ValueRef};
    let mut map = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let v = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(i)?),
                "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(i)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => Value::Array(
                    row.try_get::<Vec<u8>, _>(i)?
                        .into_iter()
                        .map(Value::from)
                        .collect(),
                ),
                _ => Value::String(row.try_get::<String, _>(i)?),
            }
        };
        map.insert(col.name().to_string(), v);
    }
    Ok(Value::Object(map))
}
