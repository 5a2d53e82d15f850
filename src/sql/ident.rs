//! Identifier checks for caller-supplied table and column names.
//!
//! Values are always bound, but table names, filter keys, sort keys and body
//! keys can only be spliced into SQL text. Every such name must pass
//! [`validate`] and is emitted through [`quoted`].

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// Longest identifier PostgreSQL keeps without truncation.
pub const MAX_IDENT_LEN: usize = 63;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

pub fn is_valid(name: &str) -> bool {
    name.len() <= MAX_IDENT_LEN && pattern().is_match(name)
}

pub fn validate(name: &str) -> Result<&str, AppError> {
    if is_valid(name) {
        Ok(name)
    } else {
        Err(AppError::Validation(format!("invalid identifier: {}", name)))
    }
}

/// Quote identifier (caller must have validated it).
pub fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
