//! Text-generation service client.
//!
//! The pipeline treats the model as a stateless `complete(prompt) -> string`
//! collaborator. Production uses an OpenAI-compatible chat-completions
//! endpoint; tests substitute a deterministic stub.

mod api;
mod traits;

pub use api::ApiCompletionProvider;
pub use traits::CompletionProvider;
