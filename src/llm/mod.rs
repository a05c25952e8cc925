//! LLM Abstraction Layer
//!
//! A provider-neutral request/response model plus the Google Gemini backend,
//! reachable either through the Generative Language API (API key) or through
//! Vertex AI (Application Default Credentials).

pub mod auth;
pub mod core;
pub mod gemini;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::{ErrorKind, LlmError},
    provider::{ContentGenerator, EventStream},
    types::{
        ContentBlock, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
        StreamEvent, UsageMetadata,
    },
};
