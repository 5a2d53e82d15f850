//! POST /query: raw SQL for holders of the shared secret.

use crate::error::AppError;
use crate::response::json_body;
use crate::service::{RawQuery, RawQueryService, RawResult};
use crate::state::AppState;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, Json};
use serde_json::Value;

pub async fn raw_query(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RawResult>, AppError> {
    let body = json_body(&body?)?.unwrap_or(Value::Null);
    let query = RawQuery::from_json(&body)?;
    let res = RawQueryService::run(state.db.as_ref(), query).await?;
    Ok(Json(res))
}
