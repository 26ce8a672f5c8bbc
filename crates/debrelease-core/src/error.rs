//! Error types for the core library

use thiserror::Error;

/// Core error type for debrelease operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A mandatory configuration value is absent
    #[error("Missing configuration: {field}")]
    MissingConfiguration { field: String },

    /// A configuration value is present but unusable
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// Result type alias for debrelease operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a missing configuration error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingConfiguration { field: field.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Whether this error stems from configuration rather than the host
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingConfiguration { .. } | Self::ConfigError { .. })
    }
}
