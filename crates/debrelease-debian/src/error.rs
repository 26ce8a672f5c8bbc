//! Error types for Debian control file handling

use thiserror::Error;

/// Debian-specific error types
#[derive(Error, Debug)]
pub enum DebianError {
    /// An expected anchor line or token is absent from a skeleton file
    #[error("Templating error: anchor '{anchor}' not found in {file}")]
    Templating { file: String, anchor: String },

    /// The skeleton has not been generated yet
    #[error("Missing required file: {file}")]
    MissingFile { file: String },

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] debrelease_core::error::Error),
}

/// Result type alias for Debian operations
pub type Result<T> = std::result::Result<T, DebianError>;

impl DebianError {
    /// Create a templating error
    pub fn templating(file: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self::Templating { file: file.into(), anchor: anchor.into() }
    }

    /// Create a missing file error
    pub fn missing_file(file: impl Into<String>) -> Self {
        Self::MissingFile { file: file.into() }
    }
}
