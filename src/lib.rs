//! tablerest: a table-agnostic REST facade over PostgreSQL or SQLite, guarded
//! by one shared bearer token.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use auth::{hash_password, Argon2Verifier, CredentialVerifier, LoginOptions, TokenGate};
pub use config::{DatabaseKind, Secret, Settings};
pub use db::{connect, SharedExecutor, StatementExecutor};
pub use error::{AppError, ConfigError};
pub use resolver::{ResourceRequest, Resolver, ResolverOptions, StatementPlan};
pub use routes::{app_router, common_routes, rest_routes};
pub use sql::{BindValue, Dialect, QueryBuf};
pub use state::AppState;
