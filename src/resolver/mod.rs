//! Resource query resolution: HTTP verb + table + optional row id + query
//! directives + body in, one parameterized statement plan out.

mod directives;
mod plan;
pub use directives::parse_directives;
pub use plan::{ResourceRequest, Resolver, ResolverOptions, StatementPlan};
