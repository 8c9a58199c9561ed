//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Override file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Override file is not valid YAML for the expected shape.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A required value is absent or empty.
    #[error("missing configuration value '{key}'")]
    Missing { key: String },
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
