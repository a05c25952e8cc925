//! Provider trait for content generators

use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use super::{
    error::LlmError,
    types::{GenerateRequest, GenerateResponse, StreamEvent},
};

/// Boxed stream of incremental generation events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that every model backend must satisfy
///
/// The gateway only talks to this trait, so tests can script replies
/// without any network access.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Stream generate content from the model
    ///
    /// This method sends a request to the model and returns a stream of events
    /// representing the incremental response.
    ///
    /// # Arguments
    /// * `request` - The generation request with messages and config
    ///
    /// # Returns
    /// A pinned boxed stream of `StreamEvent` results, or an error if the request fails
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;

    /// Generate a complete response
    ///
    /// The default implementation drains `stream_generate` and concatenates the
    /// text deltas. Backends with a dedicated one-shot endpoint override it.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let mut events = self.stream_generate(request).await?;
        let mut response = GenerateResponse {
            text: String::new(),
            finish_reason: None,
            usage: None,
        };

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::TextDelta { text } => response.text.push_str(&text),
                StreamEvent::MessageEnd {
                    finish_reason,
                    usage,
                } => {
                    response.finish_reason = Some(finish_reason);
                    response.usage = Some(usage);
                }
                StreamEvent::MessageStart { .. } => {}
            }
        }

        Ok(response)
    }
}
