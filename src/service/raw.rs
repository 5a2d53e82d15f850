//! Raw Query Executor: caller-written SQL, positional params, native-ish result.
//! Only reachable behind the token gate; any secret holder has full SQL access.

use crate::db::StatementExecutor;
use crate::error::AppError;
use crate::sql::{BindValue, QueryBuf};
use serde::Serialize;
use serde_json::Value;

/// Leading keywords whose statements produce a result set.
const ROW_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "SHOW", "EXPLAIN", "PRAGMA", "TABLE"];

#[derive(Clone, Debug, PartialEq)]
pub struct RawQuery {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl RawQuery {
    /// `{query, params?}`. `params` defaults to no binds.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let sql = body
            .get("query")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Query is required".into()))?;
        let params = match body.get("params") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(BindValue::from_json).collect(),
            Some(_) => return Err(AppError::Validation("params must be an array".into())),
        };
        Ok(RawQuery {
            sql: sql.to_string(),
            params,
        })
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    pub command: String,
    pub row_count: u64,
    pub rows: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<i64>,
}

pub struct RawQueryService;

impl RawQueryService {
    pub async fn run(db: &dyn StatementExecutor, query: RawQuery) -> Result<RawResult, AppError> {
        let command = leading_keyword(&query.sql);
        let q = QueryBuf::raw(query.sql, query.params);
        tracing::info!(command = %command, "raw query");
        if returns_rows(&command, &q.sql) {
            let rows = db.fetch_all(&q).await?;
            Ok(RawResult {
                row_count: rows.len() as u64,
                command,
                rows,
                last_insert_id: None,
            })
        } else {
            let done = db.execute(&q).await?;
            let last_insert_id = if command == "INSERT" { done.last_insert_id } else { None };
            Ok(RawResult {
                command,
                row_count: done.rows_affected,
                rows: Vec::new(),
                last_insert_id,
            })
        }
    }
}

/// First word of the statement, upper-cased, skipping whitespace and opening parens.
fn leading_keyword(sql: &str) -> String {
    sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn returns_rows(command: &str, sql: &str) -> bool {
    ROW_KEYWORDS.contains(&command)
        || sql
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .any(|w| w.eq_ignore_ascii_case("RETURNING"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_default_to_empty() {
        let q = RawQuery::from_json(&json!({"query": "SELECT 1"})).unwrap();
        assert_eq!(q.sql, "SELECT 1");
        assert!(q.params.is_empty());
    }

    #[test]
    fn query_is_required() {
        for body in [json!({}), json!({"query": ""}), json!({"query": "  "}), json!({"query": 5})] {
            let err = RawQuery::from_json(&body).unwrap_err();
            assert_eq!(err.to_string(), "Query is required");
        }
    }

    #[test]
    fn params_must_be_an_array() {
        let err = RawQuery::from_json(&json!({"query": "SELECT $1", "params": "x"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let q = RawQuery::from_json(&json!({"query": "SELECT $1", "params": [1, "a"]})).unwrap();
        assert_eq!(q.params, vec![BindValue::Int(1), BindValue::Text("a".into())]);
    }

    #[test]
    fn classifies_statements() {
        assert_eq!(leading_keyword("  select 1"), "SELECT");
        assert_eq!(leading_keyword("(SELECT 1) UNION (SELECT 2)"), "SELECT");
        assert!(returns_rows("WITH", "WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(returns_rows("INSERT", "insert into t (a) values (1) returning id"));
        assert!(!returns_rows("INSERT", "INSERT INTO t (returning_flag) VALUES (1)"));
        assert!(!returns_rows("DELETE", "DELETE FROM t"));
    }

    #[test]
    fn result_uses_camel_case_keys() {
        let r = RawResult {
            command: "INSERT".into(),
            row_count: 1,
            rows: vec![],
            last_insert_id: Some(4),
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"command": "INSERT", "rowCount": 1, "rows": [], "lastInsertId": 4})
        );
    }
}
