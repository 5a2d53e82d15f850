//! Environment-driven settings. `Settings::from_env` for the process,
//! `Settings::from_lookup` for anything else that can answer a key.

use crate::auth::LoginOptions;
use crate::config::Secret;
use crate::error::ConfigError;
use crate::resolver::ResolverOptions;
use crate::sql::ident;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
}

impl DatabaseKind {
    fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(DatabaseKind::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(DatabaseKind::Sqlite)
        } else {
            // Only the scheme: the rest may carry credentials.
            let scheme = url.split(':').next().unwrap_or_default();
            Err(ConfigError::UnsupportedDatabase(scheme.to_string()))
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub database_kind: DatabaseKind,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub secret: Secret,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub rest: ResolverOptions,
    pub login: LoginOptions,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let database_kind = DatabaseKind::from_url(&database_url)?;
        let id_column = identifier(&get, "REST_ID_COLUMN", "id")?;

        let tables = list(&get, "REST_TABLES");
        let tables = if tables.is_empty() {
            None
        } else {
            Some(identifiers("REST_TABLES", tables)?)
        };

        Ok(Settings {
            database_url,
            database_kind,
            max_connections: parse(&get, "DB_MAX_CONNECTIONS", 5)?,
            bind_addr: parse(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))?,
            secret: Secret::load(&get)?,
            cors_origins: list(&get, "CORS_ORIGINS"),
            body_limit_bytes: parse(&get, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT)?,
            rest: ResolverOptions {
                id_column: id_column.clone(),
                tables,
                hidden_columns: identifiers("REST_HIDDEN_COLUMNS", list(&get, "REST_HIDDEN_COLUMNS"))?,
                max_limit: parse(&get, "REST_MAX_LIMIT", 1000)?,
            },
            login: LoginOptions {
                users_table: identifier(&get, "AUTH_USERS_TABLE", "users")?,
                email_column: "email".into(),
                password_column: identifier(&get, "AUTH_PASSWORD_COLUMN", "password_hash")?,
                id_column,
            },
        })
    }
}

fn parse<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key).filter(|s| !s.trim().is_empty()) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

/// Comma-separated list, blanks dropped.
fn list<F>(get: &F, key: &str) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn identifier<F>(get: &F, key: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string());
    if ident::is_valid(&name) {
        Ok(name)
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("invalid identifier '{}'", name),
        })
    }
}

fn identifiers(key: &'static str, names: Vec<String>) -> Result<HashSet<String>, ConfigError> {
    match names.iter().find(|n| !ident::is_valid(n)) {
        Some(bad) => Err(ConfigError::Invalid {
            key,
            reason: format!("invalid identifier '{}'", bad),
        }),
        None => Ok(names.into_iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(move |k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[("API_SECRET", "x")]).unwrap();
        assert_eq!(s.database_kind, DatabaseKind::Sqlite);
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.bind_addr.port(), 3000);
        assert!(s.cors_origins.is_empty());
        assert_eq!(s.rest.id_column, "id");
        assert_eq!(s.rest.max_limit, 1000);
        assert!(s.rest.tables.is_none());
        assert_eq!(s.login.users_table, "users");
        assert_eq!(s.login.password_column, "password_hash");
    }

    #[test]
    fn lists_and_overrides() {
        let s = settings(&[
            ("API_SECRET", "x"),
            ("DATABASE_URL", "postgres://u:p@localhost/app"),
            ("REST_TABLES", "users, posts,,"),
            ("REST_HIDDEN_COLUMNS", "password_hash"),
            ("CORS_ORIGINS", "https://a.example,https://b.example"),
            ("REST_MAX_LIMIT", "50"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();
        assert_eq!(s.database_kind, DatabaseKind::Postgres);
        let tables = s.rest.tables.unwrap();
        assert!(tables.contains("users") && tables.contains("posts") && tables.len() == 2);
        assert!(s.rest.hidden_columns.contains("password_hash"));
        assert_eq!(s.cors_origins.len(), 2);
        assert_eq!(s.rest.max_limit, 50);
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            settings(&[("API_SECRET", "x"), ("DB_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            settings(&[("API_SECRET", "x"), ("REST_TABLES", "users;--")]),
            Err(ConfigError::Invalid { key: "REST_TABLES", .. })
        ));
        assert!(matches!(
            settings(&[("API_SECRET", "x"), ("DATABASE_URL", "mysql://root:pw@db/app")]),
            Err(ConfigError::UnsupportedDatabase(s)) if s == "mysql"
        ));
        assert!(matches!(settings(&[]), Err(ConfigError::Missing("API_SECRET"))));
    }
}
