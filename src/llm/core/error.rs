//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the model provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// Authentication/token issues
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failures
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// SSE stream parsing failures
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded (429, retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Error object reported by the provider inside an otherwise successful response
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },
}

/// Failure classes the rest of the service reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Model overloaded (503 / UNAVAILABLE)
    ServiceUnavailable,
    /// Quota exhausted (429 / RATE_LIMIT)
    RateLimited,
    /// Missing or invalid credential (401 / UNAUTHENTICATED)
    Authentication,
    /// Credential rejected or flagged (403 / PERMISSION_DENIED)
    PermissionDenied,
    /// Request rejected as malformed (400 / INVALID_ARGUMENT)
    InvalidArgument,
    /// Anything else
    Other,
}

/// Substring fallback table, checked in order against upper-cased error text
const FALLBACK_TABLE: &[(&[&str], ErrorKind)] = &[
    (&["503", "UNAVAILABLE"], ErrorKind::ServiceUnavailable),
    (&["429", "RATE_LIMIT", "RATE LIMIT"], ErrorKind::RateLimited),
    (&["401", "UNAUTHENTICATED"], ErrorKind::Authentication),
    (
        &["403", "PERMISSION_DENIED", "REPORTED AS LEAKED"],
        ErrorKind::PermissionDenied,
    ),
    (&["400", "INVALID_ARGUMENT"], ErrorKind::InvalidArgument),
];

impl ErrorKind {
    /// Whether a retry may succeed
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::ServiceUnavailable | ErrorKind::RateLimited)
    }

    /// Classify from an HTTP status code
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            503 => Some(ErrorKind::ServiceUnavailable),
            429 => Some(ErrorKind::RateLimited),
            401 => Some(ErrorKind::Authentication),
            403 => Some(ErrorKind::PermissionDenied),
            400 => Some(ErrorKind::InvalidArgument),
            _ => None,
        }
    }

    /// Classify from a Google RPC status name (`error.status` in the API error body)
    pub fn from_rpc_status(status: &str) -> Option<Self> {
        match status {
            "UNAVAILABLE" => Some(ErrorKind::ServiceUnavailable),
            "RESOURCE_EXHAUSTED" => Some(ErrorKind::RateLimited),
            "UNAUTHENTICATED" => Some(ErrorKind::Authentication),
            "PERMISSION_DENIED" => Some(ErrorKind::PermissionDenied),
            "INVALID_ARGUMENT" | "FAILED_PRECONDITION" => Some(ErrorKind::InvalidArgument),
            _ => None,
        }
    }

    /// Last-resort classification by scanning free-form error text
    pub fn from_message(text: &str) -> Self {
        let upper = text.to_uppercase();
        FALLBACK_TABLE
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| upper.contains(needle)))
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Other)
    }
}

impl LlmError {
    /// Derive the failure class, preferring structured information over text
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::HttpError { status, body } => {
                ErrorKind::from_status(*status).unwrap_or_else(|| ErrorKind::from_message(body))
            }
            LlmError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            LlmError::AuthenticationError(_) => ErrorKind::Authentication,
            LlmError::ProviderError { code, message } => ErrorKind::from_rpc_status(code)
                .unwrap_or_else(|| ErrorKind::from_message(message)),
            other => ErrorKind::from_message(&other.to_string()),
        }
    }
}

// Implement conversion from common error types
impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}
