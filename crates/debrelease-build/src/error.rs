//! Error types for the build orchestration module

use std::path::PathBuf;

use thiserror::Error;

/// Build-specific error types
#[derive(Error, Debug)]
pub enum BuildError {
    /// A required executable cannot be found on the host
    #[error("Required tool not found: {tool}")]
    ToolchainMissing { tool: String },

    /// An external tool ran and reported failure
    #[error("{tool} failed{}: {reason}", .distribution.as_ref().map(|d| format!(" for {d}")).unwrap_or_default())]
    BuildTool { tool: String, distribution: Option<String>, reason: String },

    /// The source tree cannot be packaged as requested
    #[error("Invalid source tree {path:?}: {reason}")]
    InvalidSourceTree { path: PathBuf, reason: String },

    /// The tracking directory is unusable
    #[error("Tracking directory {path:?} is not usable: {reason}")]
    TrackingDirectory { path: PathBuf, reason: String },

    /// Distributions failed under the continue policy
    #[error("{} distribution(s) failed: {}", .failures.len(), .failures.join("; "))]
    DistributionsFailed { failures: Vec<String> },

    /// Release list could not be read
    #[error("Invalid release list: {reason}")]
    ReleaseList { reason: String },

    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] debrelease_core::error::Error),

    /// Debian templating error
    #[error("Debian error: {0}")]
    Debian(#[from] debrelease_debian::DebianError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for build operations
pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    /// Create a toolchain missing error
    pub fn toolchain_missing(tool: impl Into<String>) -> Self {
        Self::ToolchainMissing { tool: tool.into() }
    }

    /// Create a build tool error
    pub fn build_tool(
        tool: impl Into<String>,
        distribution: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BuildTool { tool: tool.into(), distribution, reason: reason.into() }
    }

    /// Create an invalid source tree error
    pub fn invalid_source_tree(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidSourceTree { path: path.into(), reason: reason.into() }
    }

    /// Create a tracking directory error
    pub fn tracking_directory(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::TrackingDirectory { path: path.into(), reason: reason.into() }
    }

    /// Whether the error comes from configuration rather than the host
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Core(e) => e.is_configuration(),
            Self::Debian(debrelease_debian::DebianError::Core(e)) => e.is_configuration(),
            _ => false,
        }
    }
}
