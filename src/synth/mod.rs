//! SQL synthesis and the read-only safety gate.

mod safety;
mod synthesizer;

pub use safety::{enforce_limit, read_only_violation, strip_code_fences};
pub use synthesizer::{GeneratedQuery, QuerySynthesizer};
