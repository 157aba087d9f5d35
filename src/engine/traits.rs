//! Data engine trait definitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One result row: column name to scalar JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Raw rows returned by the engine, before executor normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineRows {
    /// Column names in result order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Trait for tabular data engines.
///
/// Engines are assumed to support read-only execution and to reject write
/// statements themselves as a second line of defense. Failures must map
/// into [`crate::error::ExecutionError`] categories; implementations never
/// panic across this boundary.
#[async_trait]
pub trait DataEngine: Send + Sync {
    /// Execute a single statement, bounded by `timeout` and `max_rows`.
    async fn run_query(
        &self,
        statement: &str,
        timeout: Duration,
        max_rows: usize,
    ) -> crate::error::Result<EngineRows>;
}
