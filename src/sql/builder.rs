//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for an arbitrary table.
//! Every identifier is validated here before it is quoted into SQL text.

use crate::error::AppError;
use crate::sql::ident::{quoted, validate};
use crate::sql::BindValue;
use serde_json::{Map, Value};

/// Placeholder style of the target engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// `$1, $2, ...`
    Postgres,
    /// `?, ?, ...`
    Sqlite,
}

impl Dialect {
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => "?".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Caller-written SQL with its own placeholders.
    pub fn raw(sql: impl Into<String>, params: Vec<BindValue>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params,
        }
    }

    fn push_param(&mut self, dialect: Dialect, v: BindValue) -> String {
        self.params.push(v);
        dialect.placeholder(self.params.len())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Option<SortDirection>,
}

/// Filters, ordering and paging for a list query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    /// Exact-match filters, bound in this order.
    pub filters: Vec<(String, BindValue)>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u64>,
    /// Only applied together with `limit`.
    pub offset: Option<u64>,
}

fn bind_count(n: u64) -> BindValue {
    BindValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// SELECT * with filters joined by AND, optional ORDER BY, LIMIT and OFFSET.
pub fn select_list(dialect: Dialect, table: &str, opts: &ListOptions) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = quoted(validate(table)?);

    let mut where_parts = Vec::with_capacity(opts.filters.len());
    for (col, val) in &opts.filters {
        let col = quoted(validate(col)?);
        let ph = q.push_param(dialect, val.clone());
        where_parts.push(format!("{} = {}", col, ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };

    let order_clause = match &opts.order_by {
        Some(order) => {
            let col = quoted(validate(&order.column)?);
            match order.direction {
                Some(dir) => format!(" ORDER BY {} {}", col, dir.keyword()),
                None => format!(" ORDER BY {}", col),
            }
        }
        None => String::new(),
    };

    let mut page_clause = String::new();
    if let Some(limit) = opts.limit {
        let ph = q.push_param(dialect, bind_count(limit));
        page_clause.push_str(&format!(" LIMIT {}", ph));
        if let Some(offset) = opts.offset {
            let ph = q.push_param(dialect, bind_count(offset));
            page_clause.push_str(&format!(" OFFSET {}", ph));
        }
    }

    q.sql = format!(
        "SELECT * FROM {}{}{}{}",
        table, where_clause, order_clause, page_clause
    );
    Ok(q)
}

/// SELECT one row by its identifier column.
pub fn select_by_id(dialect: Dialect, table: &str, id_column: &str, id: BindValue) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = quoted(validate(table)?);
    let pk = quoted(validate(id_column)?);
    let ph = q.push_param(dialect, id);
    q.sql = format!("SELECT * FROM {} WHERE {} = {}", table, pk, ph);
    Ok(q)
}

/// INSERT one row; columns and values in body key order. An empty body
/// inserts a row of column defaults.
pub fn insert(dialect: Dialect, table: &str, body: &Map<String, Value>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = quoted(validate(table)?);
    if body.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table);
        return Ok(q);
    }
    let mut cols = Vec::with_capacity(body.len());
    let mut placeholders = Vec::with_capacity(body.len());
    for (name, val) in body {
        cols.push(quoted(validate(name)?));
        placeholders.push(q.push_param(dialect, BindValue::from_json(val)));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        cols.join(", "),
        placeholders.join(", ")
    );
    Ok(q)
}

/// UPDATE by id: SET every body key, id bound last.
pub fn update(
    dialect: Dialect,
    table: &str,
    id_column: &str,
    id: BindValue,
    body: &Map<String, Value>,
) -> Result<QueryBuf, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("No fields to update".into()));
    }
    let mut q = QueryBuf::new();
    let table = quoted(validate(table)?);
    let pk = quoted(validate(id_column)?);
    let mut sets = Vec::with_capacity(body.len());
    for (name, val) in body {
        let col = quoted(validate(name)?);
        let ph = q.push_param(dialect, BindValue::from_json(val));
        sets.push(format!("{} = {}", col, ph));
    }
    let id_ph = q.push_param(dialect, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING *",
        table,
        sets.join(", "),
        pk,
        id_ph
    );
    Ok(q)
}

/// DELETE by id.
pub fn delete(dialect: Dialect, table: &str, id_column: &str, id: BindValue) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = quoted(validate(table)?);
    let pk = quoted(validate(id_column)?);
    let ph = q.push_param(dialect, id);
    q.sql = format!("DELETE FROM {} WHERE {} = {} RETURNING *", table, pk, ph);
    Ok(q)
}
