//! HTTP data engine client.
//!
//! Talks to a SQL-over-HTTP engine: `POST {base}/query` executes a statement,
//! `GET {base}/schema` returns the table catalog. HTTP status codes map onto
//! the execution error taxonomy so the executor sees typed causes.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{ExecutionError, Result, SchemaError};
use crate::schema::{SchemaDescriptor, SchemaProvider};

use super::{DataEngine, EngineRows, Row};

/// SQL-over-HTTP data engine client.
pub struct ApiDataEngine {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Query request format.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    statement: &'a str,
    timeout_ms: u64,
    max_rows: usize,
}

/// Query response format.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
}

/// Engine error body, when the engine reports one.
#[derive(Debug, Deserialize)]
struct EngineErrorResponse {
    error: String,
}

impl ApiDataEngine {
    /// Create a new engine client from configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExecutionError::Unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .or_else(|| std::env::var("QUARRY_ENGINE_API_KEY").ok()),
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }

    async fn error_body(response: reqwest::Response) -> String {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        match serde_json::from_str::<EngineErrorResponse>(&text) {
            Ok(body) => body.error,
            Err(_) => text,
        }
    }
}

#[async_trait]
impl DataEngine for ApiDataEngine {
    async fn run_query(
        &self,
        statement: &str,
        timeout: Duration,
        max_rows: usize,
    ) -> Result<EngineRows> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            statement,
            timeout_ms: timeout.as_millis() as u64,
            max_rows,
        };

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutionError::Timeout(timeout.as_millis() as u64)
                } else {
                    ExecutionError::Unknown(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let result: QueryResponse = response
                .json()
                .await
                .map_err(|e| ExecutionError::Unknown(format!("Failed to parse response: {}", e)))?;
            return Ok(EngineRows {
                columns: result.columns,
                rows: result.rows,
            });
        }

        let message = Self::error_body(response).await;
        let err = match status.as_u16() {
            400 | 422 => ExecutionError::Syntax(message),
            401 | 403 => ExecutionError::Permission(message),
            402 | 429 => ExecutionError::Quota(message),
            408 | 504 => ExecutionError::Timeout(timeout.as_millis() as u64),
            _ => ExecutionError::Unknown(format!("Engine error ({}): {}", status, message)),
        };
        Err(err.into())
    }
}

#[async_trait]
impl SchemaProvider for ApiDataEngine {
    async fn fetch_schema(&self) -> Result<SchemaDescriptor> {
        let url = format!("{}/schema", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| SchemaError::Unavailable(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_body(response).await;
            return Err(SchemaError::Unavailable(format!("{}: {}", status, message)).into());
        }

        let schema: SchemaDescriptor = response
            .json()
            .await
            .map_err(|e| SchemaError::Unavailable(format!("Failed to parse schema: {}", e)))?;

        if schema.is_empty() {
            return Err(SchemaError::Empty.into());
        }
        Ok(schema)
    }
}
