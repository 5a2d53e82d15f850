//! Statement execution against the configured engine. Everything above this
//! module sees rows as JSON objects and never touches a driver type.

mod postgres;
mod sqlite;
pub use postgres::PgExecutor;
pub use sqlite::SqliteExecutor;

use crate::config::{DatabaseKind, Settings};
use crate::error::AppError;
use crate::sql::{Dialect, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

/// Result of a statement that returns no rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Only reported by engines that track it per connection (SQLite).
    pub last_insert_id: Option<i64>,
}

#[async_trait]
pub trait StatementExecutor: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError>;

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError>;

    async fn execute(&self, q: &QueryBuf) -> Result<ExecOutcome, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

pub type SharedExecutor = Arc<dyn StatementExecutor>;

/// Open a pool for `settings.database_url` and wrap it in the matching executor.
pub async fn connect(settings: &Settings) -> Result<SharedExecutor, AppError> {
    let url = settings.database_url.as_str();
    let executor: SharedExecutor = match settings.database_kind {
        DatabaseKind::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(url)
                .await?;
            Arc::new(PgExecutor::new(pool))
        }
        DatabaseKind::Sqlite => {
            let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
            // An in-memory database lives and dies with its one connection.
            let pool = if is_in_memory(url) {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(opts)
                    .await?
            } else {
                SqlitePoolOptions::new()
                    .max_connections(settings.max_connections)
                    .connect_with(opts)
                    .await?
            };
            Arc::new(SqliteExecutor::new(pool))
        }
    };
    tracing::info!(backend = ?settings.database_kind, "database connected");
    Ok(executor)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
