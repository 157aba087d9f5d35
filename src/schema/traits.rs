//! Schema provider trait definition.

use async_trait::async_trait;

use super::SchemaDescriptor;

/// Trait for schema lookup services.
///
/// Read-only collaborator. A fetch failure maps to `SCHEMA_UNAVAILABLE`
/// and fails the pipeline invocation fast.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Fetch the current schema from the data engine.
    async fn fetch_schema(&self) -> crate::error::Result<SchemaDescriptor>;
}
