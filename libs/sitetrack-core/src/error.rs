//! Error types for the SiteTrack core library

use thiserror::Error;

/// Result type alias for SiteTrack operations
pub type Result<T> = std::result::Result<T, SiteTrackError>;

/// Main error type for SiteTrack operations
#[derive(Error, Debug)]
pub enum SiteTrackError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {endpoint} failed with status {status}: {message}")]
    Status {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SiteTrackError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether the server answered with 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. } | Self::NotFound { .. })
    }

    /// Whether this error came from the network or the server, as opposed to local input
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}
