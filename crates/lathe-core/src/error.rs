//! Error types for Lathe

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LatheError
pub type Result<T> = std::result::Result<T, LatheError>;

/// Main error type for tool-level operations
#[derive(Debug, Error)]
pub enum LatheError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No declaration file could be located
    #[error("No declaration file found in {dir} (looked for {candidates})")]
    DeclarationNotFound { dir: PathBuf, candidates: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

impl LatheError {
    /// Whether this error stems from configuration or declaration discovery
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::DeclarationNotFound { .. })
    }
}
