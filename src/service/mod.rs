//! Execution of resolved plans and raw statements.

mod crud;
mod raw;
pub use crud::{CrudOutcome, CrudService};
pub use raw::{RawQuery, RawQueryService, RawResult};
