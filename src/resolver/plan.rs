//! Verb dispatch into a tagged statement plan.

use crate::error::AppError;
use crate::resolver::parse_directives;
use crate::sql::ident::validate;
use crate::sql::{self, BindValue, Dialect, QueryBuf};
use axum::http::Method;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One resource request as it arrives from the router.
#[derive(Clone, Copy, Debug)]
pub struct ResourceRequest<'a> {
    pub method: &'a Method,
    pub table: &'a str,
    pub row_id: Option<&'a str>,
    /// Query-string pairs in request order.
    pub directives: &'a [(String, String)],
    pub body: Option<&'a Value>,
}

/// What to run and how to answer. Every variant is exactly one statement.
#[derive(Clone, Debug, PartialEq)]
pub enum StatementPlan {
    List(QueryBuf),
    GetOne(QueryBuf),
    Create(QueryBuf),
    Update(QueryBuf),
    Delete(QueryBuf),
}

impl StatementPlan {
    pub fn statement(&self) -> &QueryBuf {
        match self {
            StatementPlan::List(q)
            | StatementPlan::GetOne(q)
            | StatementPlan::Create(q)
            | StatementPlan::Update(q)
            | StatementPlan::Delete(q) => q,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StatementPlan::List(_) => "list",
            StatementPlan::GetOne(_) => "get",
            StatementPlan::Create(_) => "create",
            StatementPlan::Update(_) => "update",
            StatementPlan::Delete(_) => "delete",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolverOptions {
    pub id_column: String,
    /// When set, only these tables are reachable.
    pub tables: Option<HashSet<String>>,
    /// Never returned, filtered on, or sorted by.
    pub hidden_columns: HashSet<String>,
    pub max_limit: u64,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            id_column: "id".into(),
            tables: None,
            hidden_columns: HashSet::new(),
            max_limit: 1000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Resolver {
    dialect: Dialect,
    opts: ResolverOptions,
}

impl Resolver {
    pub fn new(dialect: Dialect, opts: ResolverOptions) -> Self {
        Resolver { dialect, opts }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn hidden_columns(&self) -> &HashSet<String> {
        &self.opts.hidden_columns
    }

    fn table<'a>(&self, name: &'a str) -> Result<&'a str, AppError> {
        let name = validate(name)?;
        match &self.opts.tables {
            Some(allowed) if !allowed.contains(name) => Err(AppError::not_found()),
            _ => Ok(name),
        }
    }

    pub fn resolve(&self, req: ResourceRequest<'_>) -> Result<StatementPlan, AppError> {
        let table = self.table(req.table)?;
        let id_col = self.opts.id_column.as_str();
        let d = self.dialect;
        let key = |id: &str| BindValue::Key(id.to_string());

        let plan = match (req.method, req.row_id) {
            (&Method::GET, None) => {
                let opts = parse_directives(req.directives, &self.opts.hidden_columns, self.opts.max_limit)?;
                StatementPlan::List(sql::select_list(d, table, &opts)?)
            }
            (&Method::GET, Some(id)) => StatementPlan::GetOne(sql::select_by_id(d, table, id_col, key(id))?),
            (&Method::POST, None) => StatementPlan::Create(sql::insert(d, table, body_object(req.body)?)?),
            (&Method::PATCH, Some(id)) => {
                let body = match req.body {
                    Some(Value::Object(m)) => m,
                    _ => return Err(AppError::Validation("No fields to update".into())),
                };
                StatementPlan::Update(sql::update(d, table, id_col, key(id), body)?)
            }
            (&Method::DELETE, Some(id)) => StatementPlan::Delete(sql::delete(d, table, id_col, key(id))?),
            _ => return Err(AppError::MethodNotAllowed),
        };
        tracing::debug!(kind = plan.kind(), table = %table, "resolved");
        Ok(plan)
    }
}

fn body_object(body: Option<&Value>) -> Result<&Map<String, Value>, AppError> {
    match body {
        Some(Value::Object(m)) => Ok(m),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}
