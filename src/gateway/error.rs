//! Gateway error taxonomy

use thiserror::Error;

use crate::llm::{ErrorKind, LlmError};

/// Failures surfaced by gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gemini API is temporarily overloaded. Please try again in a few moments.")]
    ServiceUnavailable { source: LlmError },

    #[error("Rate limit exceeded. Please wait a moment before trying again.")]
    RateLimited { source: LlmError },

    #[error("API key is invalid or expired. Please check your GEMINI_API_KEY.")]
    Authentication { source: LlmError },

    #[error("The API key was rejected by the model provider.")]
    PermissionDenied { source: LlmError },

    #[error("Invalid request. Please check your message and try again.")]
    InvalidRequest { source: LlmError },

    #[error("Error generating response: {source}")]
    Generation { source: LlmError },

    #[error("Chat session {0} not found")]
    SessionNotFound(String),

    #[error("Image file is empty")]
    EmptyImage,

    /// Glucose meter could not be read; carries the user-facing reason
    #[error("{0}")]
    Unreadable(String),

    #[error("Could not determine if image is glucose meter or food. Please upload a clear image.")]
    Undeterminable,
}

impl GatewayError {
    /// Translate a transport error using its derived `ErrorKind`
    pub fn from_llm(source: LlmError) -> Self {
        match source.kind() {
            ErrorKind::ServiceUnavailable => GatewayError::ServiceUnavailable { source },
            ErrorKind::RateLimited => GatewayError::RateLimited { source },
            ErrorKind::Authentication => GatewayError::Authentication { source },
            ErrorKind::PermissionDenied => GatewayError::PermissionDenied { source },
            ErrorKind::InvalidArgument => GatewayError::InvalidRequest { source },
            ErrorKind::Other => GatewayError::Generation { source },
        }
    }

    /// Underlying error text for diagnostics
    pub fn technical_message(&self) -> String {
        match self {
            GatewayError::ServiceUnavailable { source }
            | GatewayError::RateLimited { source }
            | GatewayError::Authentication { source }
            | GatewayError::PermissionDenied { source }
            | GatewayError::InvalidRequest { source }
            | GatewayError::Generation { source } => source.to_string(),
            other => other.to_string(),
        }
    }
}
