//! REST API request handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::{get_metrics, HealthCheck, HealthState, HealthStatus};
use crate::pipeline::{Pipeline, ResponseEnvelope};
use crate::schema::SchemaCache;

/// Application state shared across handlers.
pub struct ApiState {
    /// Pipeline for query execution.
    pub pipeline: Arc<Pipeline>,
    /// Schema cache, for the schema and health endpoints.
    pub schema_cache: Arc<SchemaCache>,
}

impl ApiState {
    /// Create new API state.
    pub fn new(pipeline: Arc<Pipeline>, schema_cache: Arc<SchemaCache>) -> Self {
        Self {
            pipeline,
            schema_cache,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query request.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Natural-language question.
    pub question: String,
}

/// Schema summary: one entry per table.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaTableSummary {
    pub name: String,
    pub columns: Vec<SchemaColumnSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaColumnSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Schema response.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaResponse {
    pub tables: Vec<SchemaTableSummary>,
    pub table_count: usize,
}

/// Error response for non-pipeline failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// POST /api/v1/query - Run a question through the pipeline.
///
/// Always returns 200 with a fully-formed envelope; pipeline failures are
/// reported inside the envelope, not as HTTP errors.
pub async fn query_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<QueryRequest>,
) -> Json<ResponseEnvelope> {
    Json(state.pipeline.run(&request.question).await)
}

/// GET /api/v1/schema - Current schema summary.
pub async fn schema_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.schema_cache.get().await {
        Ok(schema) => {
            let tables: Vec<SchemaTableSummary> = schema
                .tables
                .iter()
                .map(|t| SchemaTableSummary {
                    name: t.name.clone(),
                    columns: t
                        .columns
                        .iter()
                        .map(|c| SchemaColumnSummary {
                            name: c.name.clone(),
                            data_type: c.data_type.clone(),
                        })
                        .collect(),
                })
                .collect();
            let table_count = tables.len();
            Json(SchemaResponse {
                tables,
                table_count,
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "SCHEMA_UNAVAILABLE".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health - Liveness plus schema-provider reachability.
pub async fn health_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let schema_check = match state.schema_cache.get().await {
        Ok(schema) => HealthCheck::healthy(format!("schema ({} tables)", schema.tables.len())),
        Err(e) => HealthCheck::unhealthy("schema", e.to_string()),
    };

    let status = if schema_check.status == HealthState::Healthy {
        HealthState::Healthy
    } else {
        HealthState::Unhealthy
    };

    let body = HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: get_metrics().uptime(),
        checks: vec![schema_check],
    };

    (
        StatusCode::from_u16(status.to_status_code()).unwrap_or(StatusCode::OK),
        Json(body),
    )
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics().export_prometheus(),
    )
}
