//! Shared-secret bearer gate, password verification and login.

mod gate;
mod login;
mod verifier;

pub use gate::{require_token, Decision, TokenGate};
pub use login::{LoginOptions, LoginResponse, LoginService, LoginUser};
pub use verifier::{hash_password, verify_password, Argon2Verifier, CredentialVerifier};
