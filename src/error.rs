//! HTTP error taxonomy and rejection recovery

use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use crate::gateway::GatewayError;
use crate::imaging::ImagingError;
use crate::store;

pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
pub const RATE_LIMITED: &str = "RATE_LIMITED";
pub const AUTHENTICATION_ERROR: &str = "AUTHENTICATION_ERROR";
pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
pub const CHAT_PROCESSING_ERROR: &str = "CHAT_PROCESSING_ERROR";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";

const CHAT_FAILURE_MESSAGE: &str =
    "We're having trouble processing your request right now. Please try again in a moment.";

/// Error response: status plus `{error, code, technical_message}`
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub technical_message: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            technical_message: None,
        }
    }

    pub fn with_technical_message(mut self, technical: impl Into<String>) -> Self {
        self.technical_message = Some(technical.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, INVALID_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR, message)
    }

    /// Map a gateway failure; `generic_code` labels unclassified failures
    fn from_gateway(err: GatewayError, generic_code: &'static str) -> Self {
        let technical = err.technical_message();
        let (status, code, message) = match &err {
            GatewayError::ServiceUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                SERVICE_UNAVAILABLE,
                err.to_string(),
            ),
            GatewayError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED, err.to_string())
            }
            GatewayError::Authentication { .. } => {
                (StatusCode::UNAUTHORIZED, AUTHENTICATION_ERROR, err.to_string())
            }
            GatewayError::PermissionDenied { .. } => {
                (StatusCode::FORBIDDEN, PERMISSION_DENIED, err.to_string())
            }
            GatewayError::SessionNotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND, err.to_string()),
            GatewayError::InvalidRequest { .. }
            | GatewayError::EmptyImage
            | GatewayError::Unreadable(_)
            | GatewayError::Undeterminable => {
                (StatusCode::BAD_REQUEST, INVALID_REQUEST, err.to_string())
            }
            GatewayError::Generation { .. } => {
                let message = if generic_code == CHAT_PROCESSING_ERROR {
                    CHAT_FAILURE_MESSAGE.to_string()
                } else {
                    err.to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, generic_code, message)
            }
        };

        Self::new(status, code, message).with_technical_message(technical)
    }

    /// Map a failure on the chat path
    pub fn from_chat(err: GatewayError) -> Self {
        Self::from_gateway(err, CHAT_PROCESSING_ERROR)
    }

    /// Response body, also used for streamed error frames
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message,
            "code": self.code,
            "technical_message": self.technical_message,
        })
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::from_gateway(err, INTERNAL_ERROR)
    }
}

impl From<ImagingError> for ApiError {
    fn from(err: ImagingError) -> Self {
        match err {
            ImagingError::InvalidInput(message) => ApiError::bad_request(message),
            ImagingError::Analysis(e) => e.into(),
            ImagingError::Storage(e) => {
                ApiError::internal("Image analysis failed").with_technical_message(e.to_string())
            }
            ImagingError::Persistence(e) => e.into(),
        }
    }
}

impl From<store::Error> for ApiError {
    fn from(err: store::Error) -> Self {
        match err {
            store::Error::NotFoundError(message) => ApiError::not_found(message),
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::internal("A database error occurred").with_technical_message(other.to_string())
            }
        }
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        warp::reply::with_status(warp::reply::json(&self.body()), self.status).into_response()
    }
}

/// Turn warp's own rejections into the common error body
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let api_error = if err.is_not_found() {
        ApiError::not_found("Not found")
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        ApiError::bad_request("Invalid request body").with_technical_message(e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ApiError::bad_request("Invalid query parameters").with_technical_message(e.to_string())
    } else if let Some(e) = err.find::<warp::reject::PayloadTooLarge>() {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE, "Upload is too large")
            .with_technical_message(e.to_string())
    } else if let Some(e) = err.find::<warp::reject::UnsupportedMediaType>() {
        ApiError::bad_request("Unsupported content type").with_technical_message(e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        ApiError::bad_request("Missing header").with_technical_message(e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MethodNotAllowed>() {
        ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            METHOD_NOT_ALLOWED,
            "Method not allowed",
        )
        .with_technical_message(e.to_string())
    } else {
        warn!(rejection = ?err, "Unhandled rejection");
        ApiError::internal("Internal server error").with_technical_message(format!("{:?}", err))
    };

    Ok(api_error.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    fn http(status: u16, body: &str) -> LlmError {
        LlmError::HttpError {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_gateway_taxonomy() {
        let cases = [
            (503, StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE),
            (429, StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED),
            (401, StatusCode::UNAUTHORIZED, AUTHENTICATION_ERROR),
            (403, StatusCode::FORBIDDEN, PERMISSION_DENIED),
            (400, StatusCode::BAD_REQUEST, INVALID_REQUEST),
            (500, StatusCode::INTERNAL_SERVER_ERROR, CHAT_PROCESSING_ERROR),
        ];

        for (upstream, status, code) in cases {
            let err = ApiError::from_chat(GatewayError::from_llm(http(upstream, "boom")));
            assert_eq!(err.status, status, "upstream {}", upstream);
            assert_eq!(err.code, code, "upstream {}", upstream);
            assert!(err.technical_message.is_some());
        }
    }

    #[test]
    fn test_generic_failure_code_depends_on_path() {
        let chat = ApiError::from_chat(GatewayError::from_llm(http(500, "boom")));
        assert_eq!(chat.message, CHAT_FAILURE_MESSAGE);

        let image: ApiError = GatewayError::from_llm(http(500, "boom")).into();
        assert_eq!(image.code, INTERNAL_ERROR);
    }

    #[test]
    fn test_client_input_errors() {
        let err: ApiError = GatewayError::Undeterminable.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = ImagingError::InvalidInput("File must be an image".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body()["error"], "File must be an image");
        assert!(err.body()["technical_message"].is_null());
    }

    #[test]
    fn test_not_found() {
        let err: ApiError = GatewayError::SessionNotFound("abc".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, NOT_FOUND);
    }

    #[test]
    fn test_body_shape() {
        let body = ApiError::bad_request("nope")
            .with_technical_message("details")
            .body();
        assert_eq!(body["error"], "nope");
        assert_eq!(body["code"], "INVALID_REQUEST");
        assert_eq!(body["technical_message"], "details");
    }

    #[tokio::test]
    async fn test_recover_not_found() {
        let response = handle_rejection(warp::reject::not_found()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
