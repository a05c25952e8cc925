// HTTP Server modules
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;
pub mod state;

pub mod config;

// Persistence
pub mod store;

// LLM abstraction layer and the chat/image gateway on top of it
pub mod gateway;
pub mod llm;

pub mod analytics;
pub mod imaging;
