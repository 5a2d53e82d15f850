//! Response helpers shared by the handlers.

use crate::error::AppError;
use crate::service::CrudOutcome;
use axum::{
    body::Bytes,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

impl IntoResponse for CrudOutcome {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Request body as JSON. An empty body is `None`; anything unparsable is a 400.
pub fn json_body(bytes: &Bytes) -> Result<Option<Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| AppError::Validation(format!("invalid JSON body: {}", e)))
}
