//! Plan Compiler.
//!
//! Turns a natural-language question plus a schema into a validated
//! [`QueryPlan`]. Semantic interpretation is delegated to the completion
//! provider; this module owns the output contract: JSON parsing into the
//! tagged plan structure and schema validation, with one corrective retry.

use std::sync::Arc;

use crate::completion::CompletionProvider;
use crate::error::{PlanError, QuarryError, Result, SchemaError};
use crate::metrics::get_metrics;
use crate::schema::SchemaDescriptor;
use crate::synth::strip_code_fences;

use super::prompts::{plan_prompt, retry_suffix};
use super::QueryPlan;

/// Compiles questions into validated query plans.
pub struct PlanCompiler {
    completion: Arc<dyn CompletionProvider>,
}

impl PlanCompiler {
    /// Create a new plan compiler.
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Compile a question into a schema-validated query plan.
    ///
    /// Retries once with a corrective instruction when the model returns
    /// malformed structure or unresolvable references; the second failure
    /// is returned as-is. Completion transport failures are terminal.
    pub async fn compile(&self, question: &str, schema: &SchemaDescriptor) -> Result<QueryPlan> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PlanError::EmptyQuestion.into());
        }
        if schema.is_empty() {
            return Err(SchemaError::Empty.into());
        }

        let prompt = plan_prompt(question, schema);
        let response = self.completion.complete(&prompt).await?;

        let failure = match Self::parse_and_validate(&response, schema) {
            Ok(plan) => {
                tracing::debug!(tables = ?plan.tables, "Plan compiled on first attempt");
                return Ok(plan);
            }
            Err(e) => e,
        };

        tracing::warn!(error = %failure, "Plan rejected, retrying with corrective instruction");
        get_metrics().plan_retries_total.inc();

        let retry_prompt = format!("{}{}", prompt, retry_suffix(&failure.to_string()));
        let response = self.completion.complete(&retry_prompt).await?;

        match Self::parse_and_validate(&response, schema) {
            Ok(plan) => {
                tracing::debug!(tables = ?plan.tables, "Plan compiled on corrective retry");
                Ok(plan)
            }
            Err(e) => Err(QuarryError::Plan(e)),
        }
    }

    /// Parse a raw model response into a plan and validate it.
    fn parse_and_validate(
        response: &str,
        schema: &SchemaDescriptor,
    ) -> std::result::Result<QueryPlan, PlanError> {
        let cleaned = strip_code_fences(response);
        let plan: QueryPlan = serde_json::from_str(&cleaned)
            .map_err(|e| PlanError::MalformedPlan(e.to_string()))?;
        plan.validate(schema)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, TableDescriptor};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a scripted sequence of responses.
    struct ScriptedCompletion {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedCompletion {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| crate::error::CompletionError::EmptyResponse.into())
        }
    }

    fn sales_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![TableDescriptor::new(
            "sales",
            vec![
                ColumnDescriptor::new("country", "STRING"),
                ColumnDescriptor::new("amount", "FLOAT64"),
            ],
        )])
    }

    const GOOD_PLAN: &str = r#"{"tables":["sales"],"fields":[{"column":"country"}],"limit":10}"#;

    #[tokio::test]
    async fn test_compile_valid_plan() {
        let compiler = PlanCompiler::new(ScriptedCompletion::new(vec![GOOD_PLAN]));
        let plan = compiler.compile("countries", &sales_schema()).await.unwrap();
        assert_eq!(plan.tables, vec!["sales"]);
    }

    #[tokio::test]
    async fn test_compile_strips_markdown_fences() {
        let fenced = format!("```json\n{}\n```", GOOD_PLAN);
        let compiler = PlanCompiler::new(ScriptedCompletion::new(vec![&fenced]));
        assert!(compiler.compile("countries", &sales_schema()).await.is_ok());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_malformed_first_attempt() {
        let compiler =
            PlanCompiler::new(ScriptedCompletion::new(vec!["not json at all", GOOD_PLAN]));
        let plan = compiler.compile("countries", &sales_schema()).await.unwrap();
        assert_eq!(plan.tables, vec!["sales"]);
    }

    #[tokio::test]
    async fn test_unknown_aggregate_rejected_then_retried() {
        // A plan naming an unrecognized aggregate function is malformed, so
        // the corrective retry fires instead of a silent column fallback.
        let bad = r#"{"tables":["sales"],"fields":[{"aggregate":"median","column":"amount"}]}"#;
        let compiler = PlanCompiler::new(ScriptedCompletion::new(vec![bad, GOOD_PLAN]));
        let plan = compiler.compile("median amount", &sales_schema()).await.unwrap();
        assert_eq!(plan.tables, vec!["sales"]);
    }

    #[tokio::test]
    async fn test_second_failure_is_terminal() {
        let compiler =
            PlanCompiler::new(ScriptedCompletion::new(vec!["garbage", "more garbage"]));
        let err = compiler
            .compile("countries", &sales_schema())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuarryError::Plan(PlanError::MalformedPlan(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_table_after_retry() {
        let bad = r#"{"tables":["salez"],"fields":[{"column":"country"}]}"#;
        let compiler = PlanCompiler::new(ScriptedCompletion::new(vec![bad, bad]));
        let err = compiler
            .compile("countries", &sales_schema())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuarryError::Plan(PlanError::NoMatchingTable(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let compiler = PlanCompiler::new(ScriptedCompletion::new(vec![GOOD_PLAN]));
        let err = compiler.compile("   ", &sales_schema()).await.unwrap_err();
        assert!(matches!(err, QuarryError::Plan(PlanError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn test_empty_schema_rejected() {
        let compiler = PlanCompiler::new(ScriptedCompletion::new(vec![GOOD_PLAN]));
        let err = compiler
            .compile("countries", &SchemaDescriptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuarryError::Schema(SchemaError::Empty)));
    }
}
