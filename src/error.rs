//! Error types for the Quarry pipeline.

use thiserror::Error;

/// Main error type for Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Schema provider errors.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema unavailable: {0}")]
    Unavailable(String),

    #[error("Schema contains no tables")]
    Empty,
}

impl SchemaError {
    /// Taxonomy string carried in the response envelope.
    pub fn kind(&self) -> &'static str {
        "SCHEMA_UNAVAILABLE"
    }
}

/// Text-generation service errors.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Empty completion response")]
    EmptyResponse,
}

/// Plan compilation errors.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    #[error("Unknown field reference: {0}")]
    UnknownFieldReference(String),

    #[error("No matching table: {0}")]
    NoMatchingTable(String),

    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),
}

impl PlanError {
    /// Taxonomy string carried in the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyQuestion => "EMPTY_QUESTION",
            Self::MalformedPlan(_) => "MALFORMED_PLAN",
            Self::UnknownFieldReference(_) => "UNKNOWN_FIELD_REFERENCE",
            Self::NoMatchingTable(_) => "NO_MATCHING_TABLE",
            Self::Completion(_) => "COMPLETION_FAILED",
        }
    }
}

/// Query synthesis errors.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Unsafe statement rejected: {0}")]
    UnsafeStatement(String),

    #[error("Synthesized statement is empty")]
    EmptyStatement,

    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),
}

impl SynthesisError {
    /// Taxonomy string carried in the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsafeStatement(_) => "UNSAFE_STATEMENT",
            Self::EmptyStatement => "EMPTY_STATEMENT",
            Self::Completion(_) => "COMPLETION_FAILED",
        }
    }
}

/// Safe executor errors, tagged with the underlying engine cause.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Syntax rejected by engine: {0}")]
    Syntax(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Quota or cost limit breached: {0}")]
    Quota(String),

    #[error("Execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Refused to execute non-read-only statement: {0}")]
    Unsafe(String),

    #[error("Engine error: {0}")]
    Unknown(String),
}

impl ExecutionError {
    /// Taxonomy string carried in the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SYNTAX",
            Self::Permission(_) => "PERMISSION",
            Self::Quota(_) => "QUOTA",
            Self::Timeout(_) => "TIMEOUT",
            Self::Unsafe(_) => "UNSAFE_STATEMENT",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Result type alias for Quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;
