//! Login: email/password against the users table, answered with the shared secret.

use crate::auth::CredentialVerifier;
use crate::config::Secret;
use crate::db::StatementExecutor;
use crate::error::AppError;
use crate::sql::{self, BindValue, ListOptions};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Where users live. Every name is a validated identifier.
#[derive(Clone, Debug)]
pub struct LoginOptions {
    pub users_table: String,
    pub email_column: String,
    pub password_column: String,
    pub id_column: String,
}

impl Default for LoginOptions {
    fn default() -> Self {
        LoginOptions {
            users_table: "users".into(),
            email_column: "email".into(),
            password_column: "password_hash".into(),
            id_column: "id".into(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LoginUser {
    pub id: Value,
    pub email: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

pub struct LoginService {
    opts: LoginOptions,
    verifier: Arc<dyn CredentialVerifier>,
}

impl LoginService {
    pub fn new(opts: LoginOptions, verifier: Arc<dyn CredentialVerifier>) -> Self {
        LoginService { opts, verifier }
    }

    /// Unknown email and wrong password both end in `InvalidCredentials`.
    pub async fn login(
        &self,
        db: &dyn StatementExecutor,
        secret: &Secret,
        body: &[u8],
    ) -> Result<LoginResponse, AppError> {
        let payload: Value =
            serde_json::from_slice(body).map_err(|e| AppError::Internal(format!("invalid login body: {}", e)))?;
        let (email, password) = credentials(&payload)?;

        let lookup = ListOptions {
            filters: vec![(self.opts.email_column.clone(), BindValue::Text(email.to_string()))],
            limit: Some(1),
            ..Default::default()
        };
        let q = sql::select_list(db.dialect(), &self.opts.users_table, &lookup)?;
        let user = db.fetch_optional(&q).await?;

        // An absent user is verified against a stand-in hash at the same cost.
        let stored_hash = user
            .as_ref()
            .and_then(|u| u.get(&self.opts.password_column))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let matched = self.verifier.verify(password, stored_hash).await?;
        let user = match user {
            Some(user) if matched => user,
            _ => {
                tracing::info!("login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let id = user.get(&self.opts.id_column).cloned().unwrap_or(Value::Null);
        let email = user
            .get(&self.opts.email_column)
            .and_then(Value::as_str)
            .unwrap_or(email)
            .to_string();
        tracing::info!(user_id = %id, "login succeeded");
        Ok(LoginResponse {
            token: secret.expose().to_string(),
            user: LoginUser { id, email },
        })
    }
}

/// Both fields must be non-empty strings.
fn credentials(payload: &Value) -> Result<(&str, &str), AppError> {
    let field = |name: &str| payload.get(name).and_then(Value::as_str).filter(|s| !s.is_empty());
    match (field("email"), field("password")) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::Validation("Email and password required".into())),
    }
}
