//! Pipeline runner.
//!
//! Fixed stage order: schema, planning, synthesis, execution. The fallback
//! (direct question-to-SQL) is entered only from a planning failure and is
//! attempted once; there is no loop back into planning.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{PlanError, QuarryError};
use crate::exec::SafeExecutor;
use crate::metrics::get_metrics;
use crate::plan::PlanCompiler;
use crate::schema::SchemaCache;
use crate::synth::QuerySynthesizer;

use super::types::{PipelineStage, ResponseEnvelope};

/// Orchestrates one question through the full pipeline.
///
/// Stateless across invocations apart from the schema cache; safe to share
/// behind an `Arc` between concurrent requests.
pub struct Pipeline {
    schema_cache: Arc<SchemaCache>,
    compiler: PlanCompiler,
    synthesizer: QuerySynthesizer,
    executor: SafeExecutor,
}

impl Pipeline {
    /// Create a new pipeline from its stage components.
    pub fn new(
        schema_cache: Arc<SchemaCache>,
        compiler: PlanCompiler,
        synthesizer: QuerySynthesizer,
        executor: SafeExecutor,
    ) -> Self {
        Self {
            schema_cache,
            compiler,
            synthesizer,
            executor,
        }
    }

    /// Run one question to completion.
    ///
    /// Never returns `Err`: every outcome, including internal failures, is
    /// reported through the envelope so callers see exactly one shape.
    pub async fn run(&self, question: &str) -> ResponseEnvelope {
        let started = Instant::now();
        let metrics = get_metrics();
        metrics.queries_total.inc();
        let timer = metrics.pipeline_duration_seconds.start_timer();

        let envelope = self.run_stages(question, started).await;
        timer.observe_duration();

        if let Some(error) = &envelope.error {
            metrics
                .query_failures_total
                .with_label_values(&[error.stage.as_str()])
                .inc();
            tracing::warn!(
                stage = error.stage.as_str(),
                kind = %error.kind,
                elapsed = envelope.execution_time,
                "Pipeline failed"
            );
        } else {
            tracing::info!(
                elapsed = envelope.execution_time,
                rows = envelope.data.as_ref().map(|d| d.row_count),
                "Pipeline complete"
            );
        }
        envelope
    }

    async fn run_stages(&self, question: &str, started: Instant) -> ResponseEnvelope {
        let schema = match self.schema_cache.get().await {
            Ok(schema) => schema,
            Err(err) => {
                return ResponseEnvelope::failure(
                    question,
                    PipelineStage::Schema,
                    "SCHEMA_UNAVAILABLE",
                    err.to_string(),
                    started.elapsed().as_secs_f64(),
                );
            }
        };

        let plan = match self.compiler.compile(question, &schema).await {
            Ok(plan) => plan,
            Err(err) => {
                // An empty question cannot do better on the direct path;
                // fail without spending a completion call.
                if matches!(err, QuarryError::Plan(PlanError::EmptyQuestion)) {
                    return ResponseEnvelope::failure(
                        question,
                        PipelineStage::Planning,
                        kind_of(&err),
                        err.to_string(),
                        started.elapsed().as_secs_f64(),
                    );
                }
                tracing::warn!(error = %err, "Planning failed, taking direct fallback");
                return self.run_fallback(question, &schema, started, err).await;
            }
        };

        let query = match self.synthesizer.synthesize(&plan, &schema).await {
            Ok(query) => query,
            Err(err) => {
                return ResponseEnvelope::failure(
                    question,
                    PipelineStage::Synthesis,
                    kind_of(&err),
                    err.to_string(),
                    started.elapsed().as_secs_f64(),
                );
            }
        };

        match self.executor.execute(&query).await {
            Ok(result) => ResponseEnvelope::success(
                question,
                Some(plan),
                query.into_inner(),
                result,
                started.elapsed().as_secs_f64(),
            ),
            Err(err) => ResponseEnvelope::failure(
                question,
                PipelineStage::Execution,
                kind_of(&err),
                err.to_string(),
                started.elapsed().as_secs_f64(),
            ),
        }
    }

    /// One-shot direct synthesis when planning fails. A failure here is
    /// terminal; the pipeline never loops back into planning.
    ///
    /// A safety rejection stays attributed to the fallback stage. Any other
    /// fallback failure reports the original planning error, which names the
    /// actual problem with the question.
    async fn run_fallback(
        &self,
        question: &str,
        schema: &crate::schema::SchemaDescriptor,
        started: Instant,
        plan_err: QuarryError,
    ) -> ResponseEnvelope {
        get_metrics().fallback_total.inc();

        let query = match self.synthesizer.synthesize_direct(question, schema).await {
            Ok(query) => query,
            Err(err) => {
                let elapsed = started.elapsed().as_secs_f64();
                if matches!(
                    err,
                    QuarryError::Synthesis(crate::error::SynthesisError::UnsafeStatement(_))
                ) {
                    return ResponseEnvelope::failure(
                        question,
                        PipelineStage::Fallback,
                        kind_of(&err),
                        err.to_string(),
                        elapsed,
                    );
                }
                return ResponseEnvelope::failure(
                    question,
                    PipelineStage::Planning,
                    kind_of(&plan_err),
                    format!("{} (fallback also failed: {})", plan_err, err),
                    elapsed,
                );
            }
        };

        match self.executor.execute(&query).await {
            Ok(result) => ResponseEnvelope::success(
                question,
                None,
                query.into_inner(),
                result,
                started.elapsed().as_secs_f64(),
            ),
            Err(err) => ResponseEnvelope::failure(
                question,
                PipelineStage::Execution,
                kind_of(&err),
                err.to_string(),
                started.elapsed().as_secs_f64(),
            ),
        }
    }
}

/// Taxonomy string for an error, regardless of originating stage.
fn kind_of(err: &QuarryError) -> &'static str {
    match err {
        QuarryError::Schema(e) => e.kind(),
        QuarryError::Plan(e) => e.kind(),
        QuarryError::Synthesis(e) => e.kind(),
        QuarryError::Execution(e) => e.kind(),
        QuarryError::Completion(_) => "COMPLETION_FAILED",
        _ => "UNKNOWN",
    }
}
