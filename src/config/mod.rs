//! Configuration loading and validation.

mod settings;

pub use settings::{
    CompletionConfig, Config, EngineConfig, LimitsConfig, SchemaCacheConfig, ServerConfig,
};
