//! HTTP handlers: generic table resources, login, raw query.

pub mod auth;
pub mod query;
pub mod resource;
pub use auth::login;
pub use query::raw_query;
pub use resource::{collection, member};
