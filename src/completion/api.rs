//! API-based completion provider (OpenAI-compatible chat completions).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};
use crate::metrics::get_metrics;

use super::CompletionProvider;

/// OpenAI-compatible chat-completions provider.
pub struct ApiCompletionProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    timeout_secs: u64,
}

/// Chat completion request format.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completion response format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl ApiCompletionProvider {
    /// Create a new completion provider from configuration.
    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                CompletionError::Api(
                    "API key not provided and OPENAI_API_KEY env var not set".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Create a new completion provider with explicit parameters.
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CompletionError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            temperature: 0.01,
            timeout_secs,
        })
    }

    async fn request_completion(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let timer = get_metrics().completion_duration_seconds.start_timer();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    CompletionError::Api(format!("Connection failed: {}", e))
                } else {
                    CompletionError::Api(format!("Request failed: {}", e))
                }
            })?;

        timer.observe_duration();
        let status = response.status();

        if status.is_success() {
            let result: CompletionResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::Api(format!("Failed to parse response: {}", e)))?;

            let text = result
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();

            if text.trim().is_empty() {
                return Err(CompletionError::EmptyResponse.into());
            }
            Ok(text)
        } else if status.as_u16() == 429 {
            Err(CompletionError::RateLimited.into())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            // Try to parse as OpenAI error format
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                Err(CompletionError::Api(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                ))
                .into())
            } else {
                Err(CompletionError::Api(format!("API error ({}): {}", status, error_text)).into())
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for ApiCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.request_completion(prompt).await
    }
}
