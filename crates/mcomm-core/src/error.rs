//! Error types for gateway operations.
//!
//! This module provides the single error type shared by every MCommunity gateway crate,
//! including the mapping from transport failures and the status-carrying directory errors.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Token exchange failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// An attribute write was rejected by the directory
    #[error("Directory write failed with status {status}: {body}")]
    DirectoryWrite {
        /// HTTP status returned by the gateway
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Group creation did not return a created status
    #[error("Group reservation failed with status {status}: {body}")]
    Reservation {
        /// HTTP status returned by the gateway
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A group read needed for reconciliation did not succeed
    #[error("Directory read failed with status {status}: {body}")]
    DirectoryRead {
        /// HTTP status returned by the gateway
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Malformed directory entry
    #[error("Invalid directory entry: {0}")]
    InvalidEntry(String),

    /// Failed to parse a gateway response
    #[error("Failed to parse gateway response: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for gateway: {0}")]
    Timeout(String),

    /// Gateway is unreachable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Specialized result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthError(_) => "AUTH_ERROR",
            Self::DirectoryWrite { .. } => "DIRECTORY_WRITE_ERROR",
            Self::Reservation { .. } => "RESERVATION_ERROR",
            Self::DirectoryRead { .. } => "DIRECTORY_READ_ERROR",
            Self::InvalidEntry(_) => "INVALID_ENTRY",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// HTTP status carried by directory errors, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::DirectoryWrite { status, .. }
            | Self::Reservation { status, .. }
            | Self::DirectoryRead { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::AuthError(_)
                | Self::ConfigError(_)
                | Self::DirectoryWrite { .. }
                | Self::Reservation { .. }
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
