//! The shared bearer secret. Loaded once at startup and immutable afterwards.

use crate::error::ConfigError;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Arc<str>);

impl Secret {
    /// `None` for an empty value: an empty secret would let a bare
    /// `Authorization: Bearer ` header through.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref();
        if value.is_empty() {
            None
        } else {
            Some(Secret(Arc::from(value)))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `API_SECRET`, else the contents of `API_SECRET_FILE` without its
    /// trailing newline.
    pub(crate) fn load<F>(get: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = match (get("API_SECRET"), get("API_SECRET_FILE")) {
            (Some(v), _) if !v.is_empty() => v,
            (_, Some(path)) if !path.is_empty() => std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::SecretFile { path, source })?
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            _ => return Err(ConfigError::Missing("API_SECRET")),
        };
        Secret::new(raw).ok_or(ConfigError::Missing("API_SECRET"))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn env_value_wins() {
        let s = Secret::load(&lookup(&[("API_SECRET", "s3cret"), ("API_SECRET_FILE", "/nope")])).unwrap();
        assert_eq!(s.expose(), "s3cret");
    }

    #[test]
    fn reads_file_without_trailing_newline() {
        let path = std::env::temp_dir().join(format!("tablerest-secret-{}", std::process::id()));
        std::fs::write(&path, "from-file\n").unwrap();
        let get = lookup(&[("API_SECRET_FILE", path.to_str().unwrap())]);
        let s = Secret::load(&get).unwrap();
        assert_eq!(s.expose(), "from-file");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_or_missing_is_an_error() {
        assert!(matches!(Secret::load(&lookup(&[])), Err(ConfigError::Missing(_))));
        assert!(matches!(
            Secret::load(&lookup(&[("API_SECRET", "")])),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            Secret::load(&lookup(&[("API_SECRET_FILE", "/definitely/not/here")])),
            Err(ConfigError::SecretFile { .. })
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let s = Secret::new("hunter2").unwrap();
        assert!(!format!("{:?}", s).contains("hunter2"));
    }
}
