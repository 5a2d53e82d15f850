//! Token gate in front of every `/rest/*` and `/query` route.

use crate::config::Secret;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Clone, Debug)]
pub struct TokenGate {
    secret: Secret,
}

impl TokenGate {
    pub fn new(secret: Secret) -> Self {
        TokenGate { secret }
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    /// `Bearer <token>` or the bare token. Compared in constant time.
    pub fn authenticate(&self, header: Option<&str>) -> Decision {
        let Some(header) = header else {
            return Decision::Deny;
        };
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        if bool::from(token.as_bytes().ct_eq(self.secret.expose().as_bytes())) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Middleware: pass the request on, or answer 401 without touching the handler.
pub async fn require_token(State(gate): State<TokenGate>, req: Request, next: Next) -> Result<Response, AppError> {
    let header = req.headers().get(AUTHORIZATION);
    let header_present = header.is_some();
    match gate.authenticate(header.and_then(|v| v.to_str().ok())) {
        Decision::Allow => Ok(next.run(req).await),
        Decision::Deny => {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                header_present,
                "rejected unauthenticated request"
            );
            Err(AppError::Unauthorized)
        }
    }
}
