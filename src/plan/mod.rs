//! Query plan intermediate representation and compilation.
//!
//! A [`QueryPlan`] sits between the natural-language question and the
//! executable statement: a tagged structure over recognized clause kinds
//! (fields, filters, aggregation, ordering, limit) that is rejected by
//! construction when malformed, then validated against the schema so no
//! orphan references survive into synthesis.

mod compiler;
mod prompts;
mod types;

pub use compiler::PlanCompiler;
pub use prompts::{direct_sql_prompt, plan_prompt, retry_suffix, sql_prompt};
pub use types::{
    AggregateFunction, FieldSpec, FilterOp, FilterPredicate, OrderDirection, OrderDirective,
    QueryPlan,
};
