//! Error types for the Trellis import pipeline.

use thiserror::Error;

/// Main error type for Trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

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

/// Graph-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Object already exists: {0}")]
    Conflict(uuid::Uuid),

    #[error("Object not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

/// Result type alias for Trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;
