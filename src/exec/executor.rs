//! Safe Executor.
//!
//! Runs a generated statement against the data engine under hard bounds:
//! an independent read-only re-check, a cancellation timeout, and row
//! truncation. Engine failures come back as typed categories; nothing
//! escapes this boundary as a raw collaborator error.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{DataEngine, Row};
use crate::error::{ExecutionError, QuarryError, Result};
use crate::metrics::get_metrics;
use crate::synth::{read_only_violation, GeneratedQuery};

/// Normalized execution result: ordered rows, column ordering, row count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in result order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    /// Whether rows were cut off at the row cap.
    pub truncated: bool,
}

/// Executes generated queries under safety constraints.
pub struct SafeExecutor {
    engine: Arc<dyn DataEngine>,
    timeout: Duration,
    max_rows: usize,
}

impl SafeExecutor {
    /// Create a new executor.
    pub fn new(engine: Arc<dyn DataEngine>, timeout: Duration, max_rows: usize) -> Self {
        Self {
            engine,
            timeout,
            max_rows,
        }
    }

    /// Execute one statement and normalize the result.
    ///
    /// Re-validates read-only independently of the synthesizer; upstream
    /// validation is not trusted to have run. The timeout is a hard
    /// cancellation boundary, and rows are truncated at the cap even if
    /// the engine returns more. No internal retry on failure.
    pub async fn execute(&self, query: &GeneratedQuery) -> Result<ResultSet> {
        if let Some(violation) = read_only_violation(query.as_str()) {
            tracing::warn!(%violation, "Executor refused statement");
            get_metrics().unsafe_statements_total.inc();
            return Err(ExecutionError::Unsafe(violation).into());
        }

        let timer = get_metrics().execution_duration_seconds.start_timer();
        let outcome = tokio::time::timeout(
            self.timeout,
            self.engine.run_query(query.as_str(), self.timeout, self.max_rows),
        )
        .await;
        timer.observe_duration();

        let raw = match outcome {
            Ok(result) => result.map_err(Self::categorize)?,
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                tracing::warn!(timeout_ms = ms, "Execution cancelled at timeout");
                return Err(ExecutionError::Timeout(ms).into());
            }
        };

        let truncated = raw.rows.len() > self.max_rows;
        let mut rows = raw.rows;
        rows.truncate(self.max_rows);

        // Column ordering comes from the engine when reported, else from
        // the first row's key order.
        let columns = if raw.columns.is_empty() {
            rows.first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            raw.columns
        };

        let row_count = rows.len();
        tracing::debug!(row_count, truncated, "Execution complete");

        Ok(ResultSet {
            columns,
            rows,
            row_count,
            truncated,
        })
    }

    /// Fold any stray engine error into the execution taxonomy.
    fn categorize(err: QuarryError) -> QuarryError {
        match err {
            QuarryError::Execution(_) => err,
            other => ExecutionError::Unknown(other.to_string()).into(),
        }
    }
}
