//! Generative-model gateway
//!
//! Owns the chat session lifecycle on top of a [`ContentGenerator`]: session
//! creation with the diabetes-assistant instruction, turn-by-turn messaging
//! (complete or streamed), bounded retries for transient failures, and the
//! image extraction prompts with their typed parsers.

pub mod error;
pub mod parsing;
pub mod prompts;
pub mod session;
pub mod types;

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::llm::{
    ContentGenerator, ErrorKind, GenerateRequest, GenerationConfig, LlmError, Message, StreamEvent,
};

pub use error::GatewayError;
pub use session::{ChatHandle, InMemorySessionStore, SessionStore, SharedChat};
pub use types::{
    ChatChunk, ChatReply, FoodAnalysis, GlucoseAnalysis, HistoryEntry, ImageAnalysis, ImageKind,
    RecommendationLevel,
};

use parsing::GlucoseParseError;

/// Stream of chat fragments; the session lock is held until it is dropped or finishes
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, GatewayError>> + Send>>;

/// MIME type assumed for images sent without one
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Gateway settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Default model for new sessions and one-shot prompts
    pub model: String,
    /// Instruction given to every chat session
    pub system_prompt: String,
    /// Whether the model accepts a dedicated system instruction
    pub system_instruction_supported: bool,
    /// Additional attempts after a transient failure
    pub max_retries: u32,
    /// Linear backoff unit: attempt `n` waits `(n + 1) * retry_backoff`
    pub retry_backoff: Duration,
}

impl GatewayConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: prompts::DEFAULT_SYSTEM_PROMPT.to_string(),
            system_instruction_supported: true,
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_system_instruction_supported(mut self, supported: bool) -> Self {
        self.system_instruction_supported = supported;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Entry point for all model interactions
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn ContentGenerator>,
    sessions: Arc<dyn SessionStore>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn ContentGenerator>,
        sessions: Arc<dyn SessionStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            provider,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Create a session and return its id
    pub async fn create_session(&self, model_override: Option<&str>) -> String {
        let (session_id, _) = self.open_session(model_override).await;
        session_id
    }

    async fn open_session(&self, model_override: Option<&str>) -> (String, SharedChat) {
        let model = model_override.unwrap_or(&self.config.model);
        let mut handle = ChatHandle::new(model);

        if self.config.system_instruction_supported {
            handle.attach_system_instruction(self.config.system_prompt.clone());
        } else {
            self.apply_preamble(&mut handle).await;
        }

        let session_id = Uuid::new_v4().to_string();
        info!(
            session_id = %session_id,
            model = %handle.model(),
            system_prompt_applied = handle.system_prompt_applied(),
            "Created chat session"
        );
        let shared = self.sessions.create(session_id.clone(), handle).await;
        (session_id, shared)
    }

    /// Give the instruction as a leading user turn instead of a system instruction
    async fn apply_preamble(&self, chat: &mut ChatHandle) {
        let preamble = Message::user(prompts::system_prompt_preamble(&self.config.system_prompt));
        match self.provider.generate(chat.preamble_request(preamble.clone())).await {
            Ok(response) => chat.record_preamble(preamble, response.text),
            Err(e) => warn!(error = %e, "System prompt preamble failed, continuing without it"),
        }
    }

    /// Switch a session to the preamble when the model rejected its system instruction
    ///
    /// Returns whether the request is worth repeating.
    async fn fall_back_to_preamble(&self, chat: &mut ChatHandle, error: &LlmError) -> bool {
        if error.kind() != ErrorKind::InvalidArgument || !chat.uses_system_instruction() {
            return false;
        }
        warn!(
            model = %chat.model(),
            error = %error,
            "Model rejected the system instruction, falling back to a preamble turn"
        );
        chat.detach_system_instruction();
        self.apply_preamble(chat).await;
        true
    }

    /// Live id reuses its handle; stale or missing ids get a fresh session
    async fn resolve_session(&self, session_id: Option<&str>) -> (String, SharedChat) {
        if let Some(id) = session_id {
            if let Some(chat) = self.sessions.get(id).await {
                return (id.to_string(), chat);
            }
            debug!(session_id = %id, "Unknown session id, starting a new session");
        }
        self.open_session(None).await
    }

    /// Send one message and wait for the full reply
    pub async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, GatewayError> {
        let (session_id, chat) = self.resolve_session(session_id).await;
        let mut chat = chat.lock().await;
        let user = Message::user(text);

        let mut attempt = 0u32;
        loop {
            match self.provider.generate(chat.request_for(user.clone())).await {
                Ok(response) => {
                    chat.record_turn(user, response.text.clone());
                    return Ok(ChatReply {
                        text: response.text,
                        session_id,
                    });
                }
                Err(e) => {
                    if self.fall_back_to_preamble(&mut chat, &e).await {
                        continue;
                    }
                    if !e.kind().is_transient() || attempt >= self.config.max_retries {
                        return Err(GatewayError::from_llm(e));
                    }
                    let wait = self.config.retry_backoff * (attempt + 1);
                    warn!(
                        session_id = %session_id,
                        attempt = attempt + 1,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Transient model failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Send one message and stream the reply
    ///
    /// Every chunk carries the resolved session id. The transcript is only
    /// extended once the model stream completes.
    pub fn send_message_stream(&self, text: String, session_id: Option<String>) -> ChatStream {
        let gateway = self.clone();

        Box::pin(async_stream::stream! {
            let (session_id, chat) = gateway.resolve_session(session_id.as_deref()).await;
            let mut chat = chat.lock_owned().await;
            let user = Message::user(text);

            let request = chat.request_for(user.clone());
            let opened = match gateway.provider.stream_generate(request).await {
                Err(e) => {
                    if gateway.fall_back_to_preamble(&mut chat, &e).await {
                        gateway.provider.stream_generate(chat.request_for(user.clone())).await
                    } else {
                        Err(e)
                    }
                }
                ok => ok,
            };
            let mut events = match opened {
                Ok(events) => events,
                Err(e) => {
                    yield Err(GatewayError::from_llm(e));
                    return;
                }
            };

            let mut full_text = String::new();
            while let Some(event) = events.next().await {
                match event {
                    Ok(StreamEvent::TextDelta { text }) if !text.is_empty() => {
                        full_text.push_str(&text);
                        yield Ok(ChatChunk { text, session_id: session_id.clone() });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(GatewayError::from_llm(e));
                        return;
                    }
                }
            }

            if full_text.is_empty() {
                yield Ok(ChatChunk { text: String::new(), session_id: session_id.clone() });
            }

            chat.record_turn(user, full_text);
        })
    }

    /// Visible transcript of a live session
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, GatewayError> {
        let chat = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| GatewayError::SessionNotFound(session_id.to_string()))?;
        let chat = chat.lock().await;
        Ok(chat.history())
    }

    /// Drop a session's handle; returns whether one existed
    pub async fn delete_session(&self, session_id: &str) -> bool {
        let deleted = self.sessions.delete(session_id).await;
        if deleted {
            info!(session_id = %session_id, "Deleted chat session");
        }
        deleted
    }

    /// One-shot prompt outside any session
    async fn ask(
        &self,
        message: Message,
        config: GenerationConfig,
    ) -> Result<String, GatewayError> {
        let request = GenerateRequest::new(vec![message])
            .with_config(config)
            .with_model(self.config.model.clone());
        self.provider
            .generate(request)
            .await
            .map(|response| response.text)
            .map_err(GatewayError::from_llm)
    }

    async fn ask_about_image(
        &self,
        prompt: String,
        image: &Bytes,
        mime_type: Option<&str>,
    ) -> Result<String, GatewayError> {
        let mime_type = mime_type.unwrap_or(DEFAULT_IMAGE_MIME);
        let message = Message::user_with_image(prompt, mime_type, image.clone());
        self.ask(message, GenerationConfig::extraction()).await
    }

    /// Read a glucose meter photo, then ask for a short comment on the value
    pub async fn analyze_glucose_image(
        &self,
        image: &Bytes,
        mime_type: Option<&str>,
    ) -> Result<GlucoseAnalysis, GatewayError> {
        if image.is_empty() {
            return Err(GatewayError::EmptyImage);
        }

        let reply = self
            .ask_about_image(prompts::GLUCOSE_EXTRACTION.to_string(), image, mime_type)
            .await?;

        let reading = parsing::parse_glucose_reply(&reply).map_err(|e| match e {
            GlucoseParseError::Declined => {
                GatewayError::Unreadable("Unable to read glucose meter from image".to_string())
            }
            GlucoseParseError::NoMatch => {
                GatewayError::Unreadable(format!("Could not parse glucose value from: {}", reply))
            }
        })?;

        let analysis = self
            .ask(
                Message::user(prompts::glucose_commentary(reading.value, &reading.unit)),
                GenerationConfig::default(),
            )
            .await?;

        Ok(GlucoseAnalysis {
            value: reading.value,
            unit: reading.unit,
            analysis,
            raw_response: reply,
        })
    }

    /// Describe a meal photo and rate it for a diabetic patient
    pub async fn analyze_food_image(
        &self,
        image: &Bytes,
        mime_type: Option<&str>,
        health_context: Option<&str>,
    ) -> Result<FoodAnalysis, GatewayError> {
        if image.is_empty() {
            return Err(GatewayError::EmptyImage);
        }

        let reply = self
            .ask_about_image(prompts::food_analysis(health_context), image, mime_type)
            .await?;

        Ok(parsing::parse_food_reply(&reply))
    }

    /// Classify the photo, then run the matching extraction
    pub async fn analyze_image_auto(
        &self,
        image: &Bytes,
        mime_type: Option<&str>,
        health_context: Option<&str>,
    ) -> Result<ImageAnalysis, GatewayError> {
        if image.is_empty() {
            return Err(GatewayError::EmptyImage);
        }

        let label = self
            .ask_about_image(prompts::CLASSIFICATION.to_string(), image, mime_type)
            .await?;

        match parsing::classify_reply(&label) {
            Some(ImageKind::Glucose) => self
                .analyze_glucose_image(image, mime_type)
                .await
                .map(ImageAnalysis::Glucose),
            Some(ImageKind::Food) => self
                .analyze_food_image(image, mime_type, health_context)
                .await
                .map(ImageAnalysis::Food),
            None => {
                debug!(label = %label.trim(), "Image classification undeterminable");
                Err(GatewayError::Undeterminable)
            }
        }
    }
}
