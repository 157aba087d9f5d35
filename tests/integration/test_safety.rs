//! Safety-gate tests: destructive statements must never reach the engine.

use std::sync::atomic::Ordering;

use quarry::PipelineStage;

use crate::test_pipeline::{build_pipeline, MockEngine, ScriptedCompletion};

const SIMPLE_PLAN: &str = r#"{"tables":["sales"],"fields":[{"column":"country"}]}"#;

#[tokio::test]
async fn test_destructive_statement_rejected_before_engine() {
    // The plan compiles, but the synthesized statement is a DELETE.
    let completion = ScriptedCompletion::new(vec![SIMPLE_PLAN, "DELETE FROM sales"]);
    let engine = MockEngine::returning(0);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("delete all rows from sales").await;

    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.stage, PipelineStage::Synthesis);
    assert_eq!(error.kind, "UNSAFE_STATEMENT");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_drop_table_rejected() {
    let completion = ScriptedCompletion::new(vec![SIMPLE_PLAN, "DROP TABLE sales"]);
    let engine = MockEngine::returning(0);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("remove the sales table").await;

    assert!(!envelope.success);
    assert_eq!(envelope.error.unwrap().kind, "UNSAFE_STATEMENT");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_multi_statement_injection_rejected() {
    let completion = ScriptedCompletion::new(vec![
        SIMPLE_PLAN,
        "SELECT country FROM sales; DROP TABLE sales",
    ]);
    let engine = MockEngine::returning(0);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("countries").await;

    assert!(!envelope.success);
    assert_eq!(envelope.error.unwrap().kind, "UNSAFE_STATEMENT");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fenced_response_stripped_before_execution() {
    let completion = ScriptedCompletion::new(vec![
        SIMPLE_PLAN,
        "```sql\nSELECT country FROM sales\n```",
    ]);
    let engine = MockEngine::returning(1);
    let pipeline = build_pipeline(completion, engine);

    let envelope = pipeline.run("countries").await;

    assert!(envelope.success);
    let sql = envelope.data.unwrap().generated_sql;
    assert!(!sql.contains("```"));
    assert!(sql.starts_with("SELECT"));
}

#[tokio::test]
async fn test_generated_limit_never_exceeds_row_cap() {
    // The model ignores instructions and asks for a million rows.
    let completion = ScriptedCompletion::new(vec![
        SIMPLE_PLAN,
        "SELECT country FROM sales LIMIT 1000000",
    ]);
    let engine = MockEngine::returning(1);
    let pipeline = build_pipeline(completion, engine);

    let envelope = pipeline.run("all countries").await;

    assert!(envelope.success);
    assert!(envelope
        .data
        .unwrap()
        .generated_sql
        .ends_with("LIMIT 80"));
}

#[tokio::test]
async fn test_cte_statement_allowed() {
    let completion = ScriptedCompletion::new(vec![
        SIMPLE_PLAN,
        "WITH top AS (SELECT country FROM sales) SELECT country FROM top",
    ]);
    let engine = MockEngine::returning(1);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("countries via cte").await;

    assert!(envelope.success, "{:?}", envelope.error_message);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsafe_fallback_statement_rejected() {
    // Planning fails twice, then the direct fallback tries to mutate.
    let completion = ScriptedCompletion::new(vec![
        "garbage",
        "garbage",
        "TRUNCATE TABLE sales",
    ]);
    let engine = MockEngine::returning(0);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("empty out sales").await;

    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.stage, PipelineStage::Fallback);
    assert_eq!(error.kind, "UNSAFE_STATEMENT");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_safe_query_still_flows_through() {
    // Sanity: the gate does not over-reject a harmless SELECT mentioning a
    // keyword inside a string literal boundary-safe context.
    let completion = ScriptedCompletion::new(vec![
        SIMPLE_PLAN,
        "SELECT country FROM sales WHERE country != 'XX'",
    ]);
    let engine = MockEngine::returning(1);
    let pipeline = build_pipeline(completion, engine.clone());

    let envelope = pipeline.run("countries except XX").await;

    assert!(envelope.success);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}
