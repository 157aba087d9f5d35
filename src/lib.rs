//! Quarry: natural-language analytics over a SQL data engine.
//!
//! Takes a plain-English question, compiles it into a validated query plan
//! against the live schema, synthesizes a bounded read-only SQL statement,
//! and executes it under hard safety limits. Every invocation produces one
//! fully-formed response envelope, success or failure.

pub mod api;
pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod metrics;
pub mod pipeline;
pub mod plan;
pub mod schema;
pub mod synth;

pub use api::{create_rest_router, ApiState, RestApiConfig};
pub use completion::{ApiCompletionProvider, CompletionProvider};
pub use config::Config;
pub use engine::{ApiDataEngine, DataEngine, EngineRows, Row};
pub use error::{
    CompletionError, ConfigError, ExecutionError, PlanError, QuarryError, Result, SchemaError,
    SynthesisError,
};
pub use exec::{ResultSet, SafeExecutor};
pub use metrics::{get_metrics, HealthCheck, HealthState, HealthStatus, Metrics};
pub use pipeline::{ErrorDescriptor, Pipeline, PipelineStage, ResponseEnvelope, ResultPayload};
pub use plan::{AggregateFunction, FieldSpec, PlanCompiler, QueryPlan};
pub use schema::{ColumnDescriptor, SchemaCache, SchemaDescriptor, SchemaProvider, TableDescriptor};
pub use synth::{GeneratedQuery, QuerySynthesizer};
