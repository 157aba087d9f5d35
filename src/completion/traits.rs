//! Completion trait definitions.

use async_trait::async_trait;

/// Trait for text-generation providers.
///
/// Stateless request/response; no conversation memory is required by the
/// pipeline. Implementations must enforce their own request timeout.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a prompt and return the raw model text.
    async fn complete(&self, prompt: &str) -> crate::error::Result<String>;
}
