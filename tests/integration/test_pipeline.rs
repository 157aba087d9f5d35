//! End-to-end pipeline tests with scripted collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use quarry::{
    CompletionProvider, DataEngine, EngineRows, Pipeline, PipelineStage, PlanCompiler,
    QuerySynthesizer, Result, Row, SafeExecutor, SchemaCache, SchemaDescriptor, SchemaProvider,
    TableDescriptor,
};

/// Replays a scripted sequence of completion responses.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<&str>) -> Arc<Self> {
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
            .ok_or_else(|| quarry::CompletionError::EmptyResponse.into())
    }
}

/// In-memory engine with call counting, injectable delay and failure.
pub struct MockEngine {
    pub rows: usize,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
    pub fail_with: Option<fn() -> quarry::ExecutionError>,
}

impl MockEngine {
    pub fn returning(rows: usize) -> Arc<Self> {
        Arc::new(Self {
            rows,
            calls: AtomicUsize::new(0),
            delay: None,
            fail_with: None,
        })
    }
}

#[async_trait]
impl DataEngine for MockEngine {
    async fn run_query(
        &self,
        _statement: &str,
        _timeout: Duration,
        _max_rows: usize,
    ) -> Result<EngineRows> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(fail) = self.fail_with {
            return Err(fail().into());
        }
        let rows = (0..self.rows)
            .map(|i| {
                let mut row = Row::new();
                row.insert("country".to_string(), serde_json::json!(format!("C{}", i)));
                row.insert("total_sales".to_string(), serde_json::json!(i * 100));
                row
            })
            .collect();
        Ok(EngineRows {
            columns: vec!["country".to_string(), "total_sales".to_string()],
            rows,
        })
    }
}

struct FixedSchema;

#[async_trait]
impl SchemaProvider for FixedSchema {
    async fn fetch_schema(&self) -> Result<SchemaDescriptor> {
        Ok(sales_schema())
    }
}

pub fn sales_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(vec![TableDescriptor::new(
        "sales",
        vec![
            quarry::ColumnDescriptor::new("country", "STRING"),
            quarry::ColumnDescriptor::new("amount", "FLOAT64"),
            quarry::ColumnDescriptor::new("order_date", "DATE"),
        ],
    )])
}

pub fn build_pipeline(completion: Arc<ScriptedCompletion>, engine: Arc<MockEngine>) -> Pipeline {
    build_pipeline_with_timeout(completion, engine, Duration::from_secs(5))
}

pub fn build_pipeline_with_timeout(
    completion: Arc<ScriptedCompletion>,
    engine: Arc<MockEngine>,
    timeout: Duration,
) -> Pipeline {
    Pipeline::new(
        Arc::new(SchemaCache::disabled(Arc::new(FixedSchema))),
        PlanCompiler::new(completion.clone()),
        QuerySynthesizer::new(completion, 80),
        SafeExecutor::new(engine, timeout, 80),
    )
}

const TOP_COUNTRIES_PLAN: &str = r#"{
  "tables": ["sales"],
  "fields": [
    {"column": "country"},
    {"aggregate": "sum", "column": "amount", "alias": "total_sales"}
  ],
  "group_by": ["country"],
  "order_by": {"field": "total_sales", "direction": "desc"},
  "limit": 3
}"#;

#[tokio::test]
async fn test_aggregate_question_end_to_end() {
    let completion = ScriptedCompletion::new(vec![
        TOP_COUNTRIES_PLAN,
        "SELECT country, SUM(amount) AS total_sales FROM sales GROUP BY country ORDER BY total_sales DESC",
    ]);
    let engine = MockEngine::returning(3);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline
        .run("What are the top 3 countries by total sales?")
        .await;

    assert!(envelope.success, "{:?}", envelope.error_message);
    let plan = envelope.plan.as_ref().unwrap();
    assert_eq!(plan.tables, vec!["sales"]);
    assert_eq!(plan.limit, Some(3));

    let data = envelope.data.unwrap();
    assert_eq!(data.row_count, 3);
    assert!(data.generated_sql.ends_with("LIMIT 3"));
    assert_eq!(data.columns, vec!["country", "total_sales"]);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_table_falls_back_to_direct_synthesis() {
    // Both plan attempts reference a table the schema does not have, so the
    // pipeline takes the direct path; the third response feeds it.
    let bad_plan = r#"{"tables":["salez"],"fields":[{"column":"country"}]}"#;
    let completion = ScriptedCompletion::new(vec![
        bad_plan,
        bad_plan,
        "SELECT country FROM sales",
    ]);
    let engine = MockEngine::returning(2);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("countries in salez").await;

    assert!(envelope.success);
    assert!(envelope.plan.is_none());
    assert_eq!(envelope.data.unwrap().row_count, 2);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unresolvable_table_never_silently_succeeds() {
    let bad_plan = r#"{"tables":["salez"],"fields":[{"column":"country"}]}"#;
    // The direct fallback yields nothing usable either, so the envelope
    // reports the planning failure that names the real problem.
    let completion = ScriptedCompletion::new(vec![bad_plan, bad_plan, "```\n```"]);
    let engine = MockEngine::returning(0);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("countries in salez").await;

    assert!(!envelope.success);
    assert!(envelope.data.is_none());
    let error = envelope.error.unwrap();
    assert_eq!(error.stage, PipelineStage::Planning);
    assert_eq!(error.kind, "NO_MATCHING_TABLE");
    assert!(error.message.contains("salez"));
    assert!(envelope.error_message.is_some());
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_engine_timeout_reported_in_envelope() {
    let completion = ScriptedCompletion::new(vec![
        r#"{"tables":["sales"],"fields":[{"column":"country"}]}"#,
        "SELECT country FROM sales",
    ]);
    let engine = Arc::new(MockEngine {
        rows: 1,
        calls: AtomicUsize::new(0),
        delay: Some(Duration::from_secs(10)),
        fail_with: None,
    });
    let pipeline =
        build_pipeline_with_timeout(completion, engine.clone(), Duration::from_millis(100));

    let envelope = pipeline.run("countries").await;

    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.stage, PipelineStage::Execution);
    assert_eq!(error.kind, "TIMEOUT");
    assert!(envelope.execution_time >= 0.1);
}

#[tokio::test]
async fn test_engine_permission_error_surfaces_kind() {
    let completion = ScriptedCompletion::new(vec![
        r#"{"tables":["sales"],"fields":[{"column":"country"}]}"#,
        "SELECT country FROM sales",
    ]);
    let engine = Arc::new(MockEngine {
        rows: 0,
        calls: AtomicUsize::new(0),
        delay: None,
        fail_with: Some(|| quarry::ExecutionError::Permission("dataset denied".to_string())),
    });
    let pipeline = build_pipeline(completion, engine);

    let envelope = pipeline.run("countries").await;

    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.kind, "PERMISSION");
    assert!(error.message.contains("dataset denied"));
}

#[tokio::test]
async fn test_empty_result_is_still_success() {
    let completion = ScriptedCompletion::new(vec![
        r#"{"tables":["sales"],"fields":[{"column":"country"}]}"#,
        "SELECT country FROM sales WHERE country = 'ZZ'",
    ]);
    let engine = MockEngine::returning(0);
    let pipeline = build_pipeline(completion, engine);

    let envelope = pipeline.run("countries named ZZ").await;

    assert!(envelope.success);
    let data = envelope.data.unwrap();
    assert_eq!(data.row_count, 0);
    assert!(data.data.is_empty());
}

#[tokio::test]
async fn test_oversized_result_truncated_to_row_cap() {
    let completion = ScriptedCompletion::new(vec![
        r#"{"tables":["sales"],"fields":[{"column":"country"}]}"#,
        "SELECT country FROM sales",
    ]);
    let engine = MockEngine::returning(500);
    let pipeline = build_pipeline(completion, engine);

    let envelope = pipeline.run("all countries").await;

    assert!(envelope.success);
    let data = envelope.data.unwrap();
    assert_eq!(data.row_count, 80);
    assert_eq!(data.data.len(), 80);
}

#[tokio::test]
async fn test_empty_question_fails_without_fallback_or_engine_call() {
    // A scripted response is available, but an empty question must fail at
    // planning without taking the direct path that would consume it.
    let completion = ScriptedCompletion::new(vec!["SELECT country FROM sales"]);
    let engine = MockEngine::returning(1);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("   ").await;

    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.stage, PipelineStage::Planning);
    assert_eq!(error.kind, "EMPTY_QUESTION");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_schema_unavailable_fails_fast() {
    struct DownProvider;

    #[async_trait]
    impl SchemaProvider for DownProvider {
        async fn fetch_schema(&self) -> Result<SchemaDescriptor> {
            Err(quarry::SchemaError::Unavailable("connection refused".to_string()).into())
        }
    }

    let completion = ScriptedCompletion::new(vec![]);
    let engine = MockEngine::returning(0);
    let pipeline = Pipeline::new(
        Arc::new(SchemaCache::disabled(Arc::new(DownProvider))),
        PlanCompiler::new(completion.clone()),
        QuerySynthesizer::new(completion, 80),
        SafeExecutor::new(engine.clone(), Duration::from_secs(5), 80),
    );

    let envelope = pipeline.run("countries").await;

    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.stage, PipelineStage::Schema);
    assert_eq!(error.kind, "SCHEMA_UNAVAILABLE");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_question_yields_identical_results() {
    // With an unchanged schema and engine state, running the same question
    // twice produces the same generated SQL and the same row content.
    let sql = "SELECT country, SUM(amount) AS total_sales FROM sales GROUP BY country ORDER BY total_sales DESC";
    let completion = ScriptedCompletion::new(vec![
        TOP_COUNTRIES_PLAN,
        sql,
        TOP_COUNTRIES_PLAN,
        sql,
    ]);
    let engine = MockEngine::returning(3);
    let pipeline = build_pipeline(completion, engine.clone());

    let first = pipeline.run("top 3 countries by total sales").await;
    let second = pipeline.run("top 3 countries by total sales").await;

    assert!(first.success && second.success);
    let first_data = first.data.unwrap();
    let second_data = second.data.unwrap();
    assert_eq!(first_data.generated_sql, second_data.generated_sql);
    assert_eq!(first_data.data, second_data.data);
    assert_eq!(first_data.row_count, second_data.row_count);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_plan_retry_recovers_from_malformed_response() {
    let completion = ScriptedCompletion::new(vec![
        "I think you want the sales table.",
        r#"{"tables":["sales"],"fields":[{"column":"country"}],"limit":5}"#,
        "SELECT country FROM sales",
    ]);
    let engine = MockEngine::returning(5);
    let pipeline = build_pipeline(completion, engine);

    let envelope = pipeline.run("countries").await;

    assert!(envelope.success);
    assert_eq!(envelope.plan.unwrap().limit, Some(5));
    assert!(envelope.data.unwrap().generated_sql.ends_with("LIMIT 5"));
}
