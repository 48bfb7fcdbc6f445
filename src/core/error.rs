//! Error types for the Agylia SDK.
//!
//! Provides structured error handling with retry classification.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the Agylia SDK.
#[derive(Error, Debug)]
pub enum AgyliaError {
    /// Network-related errors (typically retryable)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-success responses from the portal
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication and signature errors
    #[error("Auth error: {message}")]
    Auth {
        message: String,
        kind: AuthErrorKind,
    },

    /// Configuration errors
    #[error("Config error: {message}")]
    Config { message: String },

    /// Parsing/serialization errors, including unexpected response shapes
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Timeout errors
    #[error("Timeout: {operation} timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        operation: String,
    },

    /// Rate limiting errors (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Invalid caller input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },
}

/// Authentication error subcategories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The portal rejected the API username / key pair
    InvalidCredentials,
    /// Required credentials were not supplied
    MissingCredentials,
    /// Signature construction or decoding failed
    SignatureError,
}

impl AgyliaError {
    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Api { status, .. } => (500..600).contains(status),
            Self::Timeout { .. } => true,
            Self::RateLimit { .. } => true,
            _ => false,
        }
    }

    /// Get suggested retry delay.
    #[must_use]
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::Network { .. } => Some(Duration::from_millis(100)),
            Self::Api { status, .. } if *status >= 500 => Some(Duration::from_millis(500)),
            Self::Timeout { .. } => Some(Duration::from_millis(50)),
            Self::RateLimit { retry_after, .. } => retry_after.or(Some(Duration::from_secs(1))),
            _ => None,
        }
    }

    /// Errors that no retry can fix: bad credentials or configuration.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Config { .. })
    }

    /// Get error category for logging.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Api { .. } => "api",
            Self::Auth { .. } => "auth",
            Self::Config { .. } => "config",
            Self::Parse { .. } => "parse",
            Self::Timeout { .. } => "timeout",
            Self::RateLimit { .. } => "rate_limit",
            Self::Validation { .. } => "validation",
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimit { .. } => Some(429),
            _ => None,
        }
    }
}

// Convenience constructors
impl AgyliaError {
    /// Create a network error with source.
    pub fn network<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error without source.
    pub fn network_simple(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an auth error with an explicit kind.
    pub fn auth(message: impl Into<String>, kind: AuthErrorKind) -> Self {
        Self::Auth {
            message: message.into(),
            kind,
        }
    }

    /// Create a signature error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            kind: AuthErrorKind::SignatureError,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a parse error with source.
    pub fn parse_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        Self::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Create a rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create a validation error for a named field.
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// Timeouts converted here carry the default 30s client timeout. `PortalClient`
/// maps its own timeouts with the configured duration instead.
#[cfg(feature = "client")]
impl From<reqwest::Error> for AgyliaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                duration: Duration::from_secs(30),
                operation: "HTTP request".to_string(),
            }
        } else if err.is_decode() {
            Self::parse_with_source("Failed to decode response body", err)
        } else if err.is_builder() {
            Self::config(format!("Invalid request: {err}"))
        } else {
            Self::network("HTTP request failed", err)
        }
    }
}

impl From<std::env::VarError> for AgyliaError {
    fn from(err: std::env::VarError) -> Self {
        Self::config(format!("Missing environment configuration: {err}"))
    }
}

impl From<serde_json::Error> for AgyliaError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_with_source(format!("JSON parsing failed: {err}"), err)
    }
}

#[cfg(feature = "client")]
impl From<url::ParseError> for AgyliaError {
    fn from(err: url::ParseError) -> Self {
        Self::config(format!("Invalid URL: {err}"))
    }
}

// Manual Clone implementation since Box<dyn Error> doesn't implement Clone
impl Clone for AgyliaError {
    fn clone(&self) -> Self {
        match self {
            Self::Network { message, .. } => Self::Network {
                message: message.clone(),
                source: None,
            },
            Self::Api { status, message } => Self::Api {
                status: *status,
                message: message.clone(),
            },
            Self::Auth { message, kind } => Self::Auth {
                message: message.clone(),
                kind: *kind,
            },
            Self::Config { message } => Self::Config {
                message: message.clone(),
            },
            Self::Parse { message, .. } => Self::Parse {
                message: message.clone(),
                source: None,
            },
            Self::Timeout {
                duration,
                operation,
            } => Self::Timeout {
                duration: *duration,
                operation: operation.clone(),
            },
            Self::RateLimit {
                message,
                retry_after,
            } => Self::RateLimit {
                message: message.clone(),
                retry_after: *retry_after,
            },
            Self::Validation { message, field } => Self::Validation {
                message: message.clone(),
                field: field.clone(),
            },
        }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, AgyliaError>;

/// Short alias for [`AgyliaError`].
pub type Error = AgyliaError;
