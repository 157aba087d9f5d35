//! REST API router and configuration.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{
    health_handler, metrics_handler, query_handler, schema_handler, ApiState,
};
use crate::pipeline::Pipeline;
use crate::schema::SchemaCache;

/// REST API configuration.
#[derive(Debug, Clone)]
pub struct RestApiConfig {
    /// Enable CORS.
    pub enable_cors: bool,
    /// Allowed origins for CORS.
    pub cors_origins: Vec<String>,
    /// API prefix (e.g., "/api/v1").
    pub prefix: String,
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            prefix: "/api/v1".to_string(),
        }
    }
}

/// Create the REST API router.
///
/// Endpoints:
/// - POST /api/v1/query   - Run a question through the pipeline
/// - GET  /api/v1/schema  - Current schema summary
/// - GET  /health         - Liveness and dependency health
/// - GET  /metrics        - Prometheus text exposition
pub fn create_rest_router(
    pipeline: Arc<Pipeline>,
    schema_cache: Arc<SchemaCache>,
    config: &RestApiConfig,
) -> Router {
    let state = Arc::new(ApiState::new(pipeline, schema_cache));

    let api_routes = Router::new()
        .route("/query", post(query_handler))
        .route("/schema", get(schema_handler));

    let router = Router::new()
        .nest(&config.prefix, api_routes)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_origin(Any);

        router.layer(cors)
    } else {
        router
    }
}
