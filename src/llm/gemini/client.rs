//! Gemini client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::llm::auth::adc::AuthenticationManager;
use crate::llm::core::{
    error::LlmError,
    provider::{ContentGenerator, EventStream},
    types::{GenerateRequest, GenerateResponse, StreamEvent},
};

use super::mapper::{from_gemini_response, to_gemini_request, to_generate_response};
use super::sse::parse_sse_stream;
use super::types::{GenerateContentResponse, GoogleErrorResponse};

/// Public Generative Language API endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// How the client authenticates against Google
pub enum GeminiAuth {
    /// Generative Language API with an `x-goog-api-key` header
    ApiKey { api_key: String, base_url: String },
    /// Vertex AI with Application Default Credentials
    Adc {
        manager: AuthenticationManager,
        project_id: String,
        location: String,
    },
}

/// Which `generateContent` flavour to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Generate,
    Stream,
}

impl Method {
    fn suffix(self) -> &'static str {
        match self {
            Method::Generate => "generateContent",
            Method::Stream => "streamGenerateContent?alt=sse",
        }
    }
}

/// Client for Gemini models, either through the public API or Vertex AI
pub struct GeminiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Credential source
    auth: GeminiAuth,
    /// Model used when the request does not name one
    default_model: String,
}

impl GeminiClient {
    /// Create a client authenticated with an API key
    pub fn with_api_key(api_key: String, default_model: String) -> Result<Self, LlmError> {
        Ok(Self {
            http_client: build_http_client()?,
            auth: GeminiAuth::ApiKey {
                api_key,
                base_url: DEFAULT_BASE_URL.to_string(),
            },
            default_model,
        })
    }

    /// Create a Vertex AI client using Application Default Credentials
    ///
    /// # Errors
    ///
    /// Returns an error if authentication initialization fails.
    pub async fn with_adc(
        project_id: String,
        location: String,
        default_model: String,
    ) -> Result<Self, LlmError> {
        let manager = AuthenticationManager::new().await?;
        Ok(Self {
            http_client: build_http_client()?,
            auth: GeminiAuth::Adc {
                manager,
                project_id,
                location,
            },
            default_model,
        })
    }

    /// Point an API-key client at a different host (proxies, local fakes)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let GeminiAuth::ApiKey { base_url, .. } = &mut self.auth {
            *base_url = url.into().trim_end_matches('/').to_string();
        }
        self
    }

    /// Model used when a request carries no override
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn endpoint_url(&self, model: &str, method: Method) -> String {
        match &self.auth {
            GeminiAuth::ApiKey { base_url, .. } => api_key_endpoint(base_url, model, method),
            GeminiAuth::Adc {
                project_id,
                location,
                ..
            } => vertex_endpoint(project_id, location, model, method),
        }
    }

    /// POST a request body and turn non-success statuses into `LlmError`
    async fn post(&self, request: GenerateRequest, method: Method) -> Result<Response, LlmError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let url = self.endpoint_url(&model, method);
        let body = to_gemini_request(request);

        debug!(model = %model, method = ?method, contents = body.contents.len(), "calling Gemini");

        let builder = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);

        let builder = match &self.auth {
            GeminiAuth::ApiKey { api_key, .. } => builder.header("x-goog-api-key", api_key),
            GeminiAuth::Adc { manager, .. } => {
                let token = manager.get_token().await?;
                builder.header("Authorization", format!("Bearer {}", token))
            }
        };

        let response = builder.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let raw = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            return Err(LlmError::RateLimitExceeded { retry_after });
        }

        Err(LlmError::HttpError {
            status: status.as_u16(),
            body: describe_error_body(&raw),
        })
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let response = self.post(request, Method::Stream).await?;

        let sse_stream = parse_sse_stream(Box::pin(response.bytes_stream()));

        let start = futures::stream::once(async {
            Ok::<_, LlmError>(StreamEvent::MessageStart {
                id: Uuid::new_v4().to_string(),
            })
        });

        // Flatten each chunk's events into the outgoing stream
        let events = sse_stream.flat_map(|result| {
            futures::stream::iter(match result {
                Ok(chunk) => from_gemini_response(chunk)
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            })
        });

        Ok(Box::pin(start.chain(events)))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let response = self.post(request, Method::Generate).await?;
        let body: GenerateContentResponse = response.json().await?;
        Ok(to_generate_response(body))
    }
}

fn build_http_client() -> Result<Client, LlmError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| LlmError::HttpError {
            status: 0,
            body: format!("Failed to create HTTP client: {}", e),
        })
}

fn api_key_endpoint(base_url: &str, model: &str, method: Method) -> String {
    format!("{}/v1beta/models/{}:{}", base_url, model, method.suffix())
}

fn vertex_endpoint(project_id: &str, location: &str, model: &str, method: Method) -> String {
    format!(
        "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
        location,
        project_id,
        location,
        model,
        method.suffix()
    )
}

/// Prefer `STATUS: message` from a Google error envelope, else the raw body
fn describe_error_body(raw: &str) -> String {
    match serde_json::from_str::<GoogleErrorResponse>(raw) {
        Ok(envelope) if !envelope.error.status.is_empty() => {
            format!("{}: {}", envelope.error.status, envelope.error.message)
        }
        Ok(envelope) => envelope.error.message,
        Err(_) => raw.to_string(),
    }
}
