//! Credential Verifier: does a plaintext password match a stored hash.
//! Stored hashes are Argon2 PHC strings.

use crate::error::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use std::sync::OnceLock;

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

/// Argon2 verification on the blocking pool, so a slow hash never stalls the
/// async workers.
#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2Verifier;

#[async_trait]
impl CredentialVerifier for Argon2Verifier {
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("password verification: {}", e)))
    }
}

/// A hash that does not parse never matches, but the password is still run
/// through Argon2 so a missing user costs as much as a wrong password.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => argon2_matches(password, &parsed),
        Err(_) => {
            if let Ok(stand_in) = PasswordHash::new(dummy_hash()) {
                argon2_matches(password, &stand_in);
            }
            false
        }
    }
}

fn argon2_matches(password: &str, hash: &PasswordHash<'_>) -> bool {
    Argon2::default()
        .verify_password(password.as_bytes(), hash)
        .is_ok()
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("tablerest-unknown-user").unwrap_or_default())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "plaintext"));
    }

    #[test]
    fn stand_in_hash_is_a_real_argon2_hash() {
        let hash = PasswordHash::new(dummy_hash()).unwrap();
        assert_eq!(hash.algorithm.as_str(), "argon2id");
        assert!(!verify_password("tablerest-other", ""));
    }

    #[tokio::test]
    async fn async_verifier_matches_sync_result() {
        let hash = hash_password("pw").unwrap();
        assert!(Argon2Verifier.verify("pw", &hash).await.unwrap());
        assert!(!Argon2Verifier.verify("nope", &hash).await.unwrap());
    }
}
