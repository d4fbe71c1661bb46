//! Error types for precept.
//!
//! Failures fall into three bands:
//! - Expected failures (bad config, malformed payloads): recovered locally
//!   or surfaced at the boundary
//! - Infrastructure failures (network, timeout, rate limits): retried
//!   with backoff up to a ceiling
//! - Invariant violations (bugs): internal errors

use thiserror::Error;

/// Top-level error type for precept.
#[derive(Debug, Error)]
pub enum PreceptError {
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: f64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PreceptError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if this error is worth retrying.
    ///
    /// Auth failures and unknown models are permanent; transport and
    /// service-level faults are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status != 401 && *status != 404,
            _ => false,
        }
    }

    /// Get retry delay hint in seconds, if the service provided one.
    pub fn retry_after(&self) -> Option<f64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Result type alias for precept.
pub type Result<T> = std::result::Result<T, PreceptError>;
