//! `/rest/:table` and `/rest/:table/:id` for every method. The resolver decides
//! which combinations exist.

use crate::error::AppError;
use crate::resolver::ResourceRequest;
use crate::response::json_body;
use crate::service::{CrudOutcome, CrudService};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::Method,
};

type Directives = Result<Query<Vec<(String, String)>>, QueryRejection>;

// Extractor rejections are taken as values so they answer in the JSON error shape.
pub async fn collection(
    State(state): State<AppState>,
    method: Method,
    path: Result<Path<String>, PathRejection>,
    query: Directives,
    body: Result<Bytes, BytesRejection>,
) -> Result<CrudOutcome, AppError> {
    let Path(table) = path?;
    let Query(directives) = query?;
    dispatch(&state, &method, &table, None, &directives, &body?).await
}

pub async fn member(
    State(state): State<AppState>,
    method: Method,
    path: Result<Path<(String, String)>, PathRejection>,
    query: Directives,
    body: Result<Bytes, BytesRejection>,
) -> Result<CrudOutcome, AppError> {
    let Path((table, id)) = path?;
    let Query(directives) = query?;
    dispatch(&state, &method, &table, Some(&id), &directives, &body?).await
}

async fn dispatch(
    state: &AppState,
    method: &Method,
    table: &str,
    row_id: Option<&str>,
    directives: &[(String, String)],
    body: &Bytes,
) -> Result<CrudOutcome, AppError> {
    // Only writes read the body.
    let body = if *method == Method::POST || *method == Method::PATCH {
        json_body(body)?
    } else {
        None
    };
    let plan = state.resolver.resolve(ResourceRequest {
        method,
        table,
        row_id,
        directives,
        body: body.as_ref(),
    })?;
    CrudService::run(state.db.as_ref(), &plan, state.resolver.hidden_columns()).await
}
