//! Types for the pipeline's externally-visible output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exec::ResultSet;
use crate::plan::QueryPlan;

/// Stage at which a pipeline invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Schema,
    Planning,
    Fallback,
    Synthesis,
    Execution,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Planning => "planning",
            Self::Fallback => "fallback",
            Self::Synthesis => "synthesis",
            Self::Execution => "execution",
        }
    }
}

/// Typed error descriptor: originating stage plus taxonomy kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub stage: PipelineStage,
    /// Taxonomy string, e.g. `NO_MATCHING_TABLE` or `TIMEOUT`.
    pub kind: String,
    pub message: String,
}

/// Successful result payload inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPayload {
    pub row_count: usize,
    pub data: Vec<crate::engine::Row>,
    pub columns: Vec<String>,
    pub generated_sql: String,
}

/// The pipeline's single externally-visible output structure.
///
/// Always fully formed: a failed invocation still reports elapsed time,
/// the original question and a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub data: Option<ResultPayload>,
    /// Elapsed wall-clock seconds for the whole invocation.
    pub execution_time: f64,
    pub error_message: Option<String>,
    /// Original question, for provenance.
    pub question: String,
    /// The compiled plan, when planning succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<QueryPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
    pub timestamp: DateTime<Utc>,
}

impl ResponseEnvelope {
    /// Build a success envelope from an executed result set.
    pub fn success(
        question: impl Into<String>,
        plan: Option<QueryPlan>,
        generated_sql: String,
        result: ResultSet,
        execution_time: f64,
    ) -> Self {
        Self {
            success: true,
            data: Some(ResultPayload {
                row_count: result.row_count,
                data: result.rows,
                columns: result.columns,
                generated_sql,
            }),
            execution_time,
            error_message: None,
            question: question.into(),
            plan,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Build a failure envelope carrying the originating stage and kind.
    pub fn failure(
        question: impl Into<String>,
        stage: PipelineStage,
        kind: impl Into<String>,
        message: impl Into<String>,
        execution_time: f64,
    ) -> Self {
        let message = message.into();
        Self {
            success: false,
            data: None,
            execution_time,
            error_message: Some(message.clone()),
            question: question.into(),
            plan: None,
            error: Some(ErrorDescriptor {
                stage,
                kind: kind.into(),
                message,
            }),
            timestamp: Utc::now(),
        }
    }
}
