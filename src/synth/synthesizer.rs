//! Query Synthesizer.
//!
//! Converts a validated plan (or, on the fallback path, the raw question)
//! into a single executable statement. Synthesis is delegated to the
//! completion provider; this module owns the safety post-processing:
//! prose stripping, the read-only gate, and row-limit enforcement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::completion::CompletionProvider;
use crate::error::{Result, SynthesisError};
use crate::metrics::get_metrics;
use crate::plan::{direct_sql_prompt, sql_prompt, QueryPlan};
use crate::schema::SchemaDescriptor;

use super::safety::{enforce_limit, read_only_violation, strip_code_fences};

/// A single executable statement, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery(String);

impl GeneratedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for GeneratedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthesizes plans and questions into bounded read-only statements.
pub struct QuerySynthesizer {
    completion: Arc<dyn CompletionProvider>,
    /// System-wide maximum row count; every statement leaves here with an
    /// explicit LIMIT no greater than this.
    max_rows: usize,
}

impl QuerySynthesizer {
    /// Create a new synthesizer.
    pub fn new(completion: Arc<dyn CompletionProvider>, max_rows: usize) -> Self {
        Self {
            completion,
            max_rows,
        }
    }

    /// Synthesize a statement from a validated query plan.
    pub async fn synthesize(
        &self,
        plan: &QueryPlan,
        schema: &SchemaDescriptor,
    ) -> Result<GeneratedQuery> {
        let prompt = sql_prompt(plan, schema, self.max_rows);
        let raw = self.completion.complete(&prompt).await?;
        self.finish(&raw, plan.limit)
    }

    /// Fallback path: synthesize straight from the question, skipping the
    /// structured plan. Subject to the same gate and limit enforcement.
    pub async fn synthesize_direct(
        &self,
        question: &str,
        schema: &SchemaDescriptor,
    ) -> Result<GeneratedQuery> {
        let prompt = direct_sql_prompt(question, schema, self.max_rows);
        let raw = self.completion.complete(&prompt).await?;
        self.finish(&raw, None)
    }

    /// Shared post-processing: strip, gate, bound.
    fn finish(&self, raw: &str, limit_hint: Option<u32>) -> Result<GeneratedQuery> {
        let sql = strip_code_fences(raw);
        if sql.is_empty() {
            return Err(SynthesisError::EmptyStatement.into());
        }

        if let Some(violation) = read_only_violation(&sql) {
            tracing::warn!(%violation, "Rejected unsafe statement");
            get_metrics().unsafe_statements_total.inc();
            return Err(SynthesisError::UnsafeStatement(violation).into());
        }

        let default_limit = limit_hint
            .map(|h| (h as usize).min(self.max_rows))
            .unwrap_or(self.max_rows);
        let bounded = enforce_limit(&sql, default_limit, self.max_rows);

        Ok(GeneratedQuery(bounded))
    }
}
