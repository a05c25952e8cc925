//! Gemini provider implementation
//!
//! A client for Google's Gemini models implementing the `ContentGenerator`
//! trait, over either the Generative Language API or Vertex AI.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

// Re-export main types for convenience
pub use client::{GeminiAuth, GeminiClient, DEFAULT_BASE_URL};
