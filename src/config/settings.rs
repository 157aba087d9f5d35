//! Configuration settings for the Quarry server.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub engine: EngineConfig,
    pub limits: LimitsConfig,
    pub schema_cache: SchemaCacheConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("quarry.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("quarry/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".quarry/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.completion.base_url.is_empty() {
            return Err(ConfigError::MissingField("completion.base_url".to_string()).into());
        }
        if self.completion.model.is_empty() {
            return Err(ConfigError::MissingField("completion.model".to_string()).into());
        }
        if self.engine.base_url.is_empty() {
            return Err(ConfigError::MissingField("engine.base_url".to_string()).into());
        }
        if self.limits.max_rows == 0 {
            return Err(ConfigError::Invalid("limits.max_rows must be > 0".to_string()).into());
        }
        if self.limits.execution_timeout_secs == 0 {
            return Err(
                ConfigError::Invalid("limits.execution_timeout_secs must be > 0".to_string())
                    .into(),
            );
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP server.
    pub bind_addr: String,
    /// HTTP port.
    pub http_port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Allowed origins for CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            http_port: 8080,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Text-generation service configuration (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL for the completion API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key (loaded from environment if not set).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature. Low by default so plans stay stable.
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 30,
            temperature: 0.01,
        }
    }
}

/// Data engine configuration (SQL-over-HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL for the data engine API.
    pub base_url: String,
    /// API key (loaded from environment if not set).
    pub api_key: Option<String>,
    /// Transport timeout in seconds. The executor applies its own
    /// hard timeout on top of this.
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Execution safety limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// System-wide maximum number of returned rows. Every generated
    /// statement carries a LIMIT clause capped at this value.
    pub max_rows: usize,
    /// Hard cancellation boundary for query execution, in seconds.
    pub execution_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rows: 80,
            execution_timeout_secs: 30,
        }
    }
}

/// Schema cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaCacheConfig {
    /// Enable caching of the fetched schema.
    pub enabled: bool,
    /// Time-to-live for a cached schema, in seconds.
    pub ttl_secs: u64,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
        }
    }
}
