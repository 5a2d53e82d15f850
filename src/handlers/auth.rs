//! POST /rest/auth/login. The only `/rest` route outside the token gate.

use crate::auth::LoginResponse;
use crate::error::AppError;
use crate::state::AppState;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, Json};

pub async fn login(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let body = body?;
    let res = state
        .login
        .login(state.db.as_ref(), state.gate.secret(), &body)
        .await?;
    Ok(Json(res))
}
