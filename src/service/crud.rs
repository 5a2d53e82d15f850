//! Generic CRUD execution: one plan, one statement, one response shape.

use crate::db::StatementExecutor;
use crate::error::AppError;
use crate::resolver::StatementPlan;
use axum::http::StatusCode;
use serde_json::Value;
use std::collections::HashSet;

/// Status and JSON body for a successful resource request.
#[derive(Debug, PartialEq)]
pub struct CrudOutcome {
    pub status: StatusCode,
    pub body: Value,
}

impl CrudOutcome {
    fn ok(body: Value) -> Self {
        CrudOutcome {
            status: StatusCode::OK,
            body,
        }
    }
}

pub struct CrudService;

impl CrudService {
    /// List → array; get/update/delete → the row or 404; create → 201 with the new row.
    pub async fn run(
        db: &dyn StatementExecutor,
        plan: &StatementPlan,
        hidden: &HashSet<String>,
    ) -> Result<CrudOutcome, AppError> {
        let q = plan.statement();
        match plan {
            StatementPlan::List(_) => {
                let rows = db.fetch_all(q).await?;
                let rows = rows.into_iter().map(|r| strip_hidden(r, hidden)).collect();
                Ok(CrudOutcome::ok(Value::Array(rows)))
            }
            StatementPlan::GetOne(_) | StatementPlan::Update(_) | StatementPlan::Delete(_) => {
                let row = db.fetch_optional(q).await?.ok_or_else(AppError::not_found)?;
                Ok(CrudOutcome::ok(strip_hidden(row, hidden)))
            }
            StatementPlan::Create(_) => {
                let row = db
                    .fetch_optional(q)
                    .await?
                    .ok_or_else(|| AppError::Internal("insert returned no row".into()))?;
                Ok(CrudOutcome {
                    status: StatusCode::CREATED,
                    body: strip_hidden(row, hidden),
                })
            }
        }
    }
}

fn strip_hidden(mut row: Value, hidden: &HashSet<String>) -> Value {
    if let Value::Object(map) = &mut row {
        map.retain(|k, _| !hidden.contains(k));
    }
    row
}
