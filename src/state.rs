//! Shared application state for all routes. Built once at startup; nothing in it changes afterwards.

use crate::auth::{Argon2Verifier, CredentialVerifier, LoginService, TokenGate};
use crate::config::Settings;
use crate::db::SharedExecutor;
use crate::resolver::Resolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedExecutor,
    pub resolver: Arc<Resolver>,
    pub gate: TokenGate,
    pub login: Arc<LoginService>,
}

impl AppState {
    pub fn new(db: SharedExecutor, settings: &Settings) -> Self {
        Self::with_verifier(db, settings, Arc::new(Argon2Verifier))
    }

    /// Same as `new` with a different password check.
    pub fn with_verifier(db: SharedExecutor, settings: &Settings, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let resolver = Resolver::new(db.dialect(), settings.rest.clone());
        AppState {
            resolver: Arc::new(resolver),
            gate: TokenGate::new(settings.secret.clone()),
            login: Arc::new(LoginService::new(settings.login.clone(), verifier)),
            db,
        }
    }
}
