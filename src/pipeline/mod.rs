//! Pipeline orchestration.
//!
//! Composes schema fetch, plan compilation, query synthesis and safe
//! execution into one `run(question)` operation, with the fallback path
//! (direct question-to-SQL) reachable only from a planning failure.

mod runner;
mod types;

pub use runner::Pipeline;
pub use types::{ErrorDescriptor, PipelineStage, ResponseEnvelope, ResultPayload};
