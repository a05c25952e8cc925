//! Conversation handles and the store that owns them

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::llm::{GenerateRequest, Message, MessageRole};

use super::types::HistoryEntry;

/// Conversational state replayed to the model on every turn
#[derive(Debug, Clone)]
pub struct ChatHandle {
    model: String,
    system_instruction: Option<String>,
    system_prompt_applied: bool,
    /// Leading transcript entries that carry the instruction preamble
    preamble_len: usize,
    transcript: Vec<Message>,
}

impl ChatHandle {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            system_prompt_applied: false,
            preamble_len: 0,
            transcript: Vec::new(),
        }
    }

    /// Send `instruction` as a dedicated system instruction on every turn
    pub fn attach_system_instruction(&mut self, instruction: String) {
        self.system_instruction = Some(instruction);
        self.system_prompt_applied = true;
    }

    /// Stop sending the system instruction, e.g. after the model rejected it
    pub fn detach_system_instruction(&mut self) {
        self.system_instruction = None;
        self.system_prompt_applied = self.preamble_len > 0;
    }

    pub fn uses_system_instruction(&self) -> bool {
        self.system_instruction.is_some()
    }

    /// Standalone request carrying only the instruction preamble
    pub fn preamble_request(&self, prompt: Message) -> GenerateRequest {
        GenerateRequest::new(vec![prompt]).with_model(self.model.clone())
    }

    /// Record the instruction exchange used when system instructions are unsupported
    ///
    /// The exchange always sits at the head of the transcript.
    pub fn record_preamble(&mut self, prompt: Message, reply: String) {
        self.transcript
            .splice(0..0, [prompt, Message::assistant(reply)]);
        self.preamble_len = 2;
        self.system_prompt_applied = true;
    }

    pub fn system_prompt_applied(&self) -> bool {
        self.system_prompt_applied
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full request for the next turn: transcript followed by `user`
    pub fn request_for(&self, user: Message) -> GenerateRequest {
        let mut messages = self.transcript.clone();
        messages.push(user);
        GenerateRequest::new(messages)
            .with_system(self.system_instruction.clone())
            .with_model(self.model.clone())
    }

    /// Append a completed exchange
    pub fn record_turn(&mut self, user: Message, reply: String) {
        self.transcript.push(user);
        self.transcript.push(Message::assistant(reply));
    }

    /// Visible history, excluding the instruction preamble
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.transcript
            .iter()
            .skip(self.preamble_len)
            .filter_map(|message| {
                let text = message.text()?;
                let role = match message.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                Some(HistoryEntry {
                    role: role.to_string(),
                    text: text.to_string(),
                })
            })
            .collect()
    }
}

/// Shared handle; the mutex serializes turns within one session
pub type SharedChat = Arc<Mutex<ChatHandle>>;

/// Process-local registry of live chat handles
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SharedChat>;

    /// Store `handle` under `session_id`, replacing any previous handle
    async fn create(&self, session_id: String, handle: ChatHandle) -> SharedChat;

    /// Returns whether a handle was removed
    async fn delete(&self, session_id: &str) -> bool;
}

/// Default store: a map behind an async read/write lock
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SharedChat>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SharedChat> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn create(&self, session_id: String, handle: ChatHandle) -> SharedChat {
        let shared = Arc::new(Mutex::new(handle));
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::clone(&shared));
        shared
    }

    async fn delete(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}
