//! Schema descriptors and the schema cache.
//!
//! The queryable data engine's schema (tables, columns, declared types) is
//! fetched on demand from a [`SchemaProvider`] and held in an explicitly
//! owned [`SchemaCache`] with a TTL refresh policy.

mod cache;
mod traits;
mod types;

pub use cache::SchemaCache;
pub use traits::SchemaProvider;
pub use types::{ColumnDescriptor, SchemaDescriptor, TableDescriptor};
