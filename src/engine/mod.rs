//! Data engine client.
//!
//! The tabular data engine is an external collaborator reached through a
//! narrow interface: `run_query` for read-only statements and, via
//! [`crate::schema::SchemaProvider`], a schema lookup. Production ships a
//! SQL-over-HTTP client; tests substitute an in-memory mock.

mod api;
mod traits;

pub use api::ApiDataEngine;
pub use traits::{DataEngine, EngineRows, Row};
