//! Query-string directives: equality filters plus the reserved
//! `sort_by`, `order`, `limit`, `offset` control keys.

use crate::error::AppError;
use crate::sql::ident::validate;
use crate::sql::{BindValue, ListOptions, OrderBy, SortDirection};
use std::collections::HashSet;

fn parse_direction(value: &str) -> Result<SortDirection, AppError> {
    if value.eq_ignore_ascii_case("asc") {
        Ok(SortDirection::Asc)
    } else if value.eq_ignore_ascii_case("desc") {
        Ok(SortDirection::Desc)
    } else {
        Err(AppError::Validation("order must be asc or desc".into()))
    }
}

fn parse_count(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be a non-negative integer", key)))
}

fn visible_column<'a>(name: &'a str, hidden: &HashSet<String>) -> Result<&'a str, AppError> {
    let name = validate(name)?;
    if hidden.contains(name) {
        return Err(AppError::Validation(format!("column not allowed: {}", name)));
    }
    Ok(name)
}

/// Turn query pairs (in request order) into list options.
///
/// Filters keep encounter order and repeat if a key repeats; for reserved
/// keys the last occurrence wins. `order` without `sort_by` is ignored and
/// `limit` is clamped to `max_limit`.
pub fn parse_directives(
    pairs: &[(String, String)],
    hidden: &HashSet<String>,
    max_limit: u64,
) -> Result<ListOptions, AppError> {
    let mut sort_by: Option<&str> = None;
    let mut direction: Option<SortDirection> = None;
    let mut opts = ListOptions::default();

    for (k, v) in pairs {
        match k.as_str() {
            "sort_by" => sort_by = Some(visible_column(v, hidden)?),
            "order" => direction = Some(parse_direction(v)?),
            "limit" => opts.limit = Some(parse_count(k, v)?.min(max_limit)),
            "offset" => opts.offset = Some(parse_count(k, v)?),
            _ => {
                let col = visible_column(k, hidden)?;
                opts.filters.push((col.to_string(), BindValue::from_query_text(v)));
            }
        }
    }

    opts.order_by = sort_by.map(|column| OrderBy {
        column: column.to_string(),
        direction,
    });
    Ok(opts)
}
