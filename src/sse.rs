use serde_json::Value;
use std::convert::Infallible;
use warp::sse::Event;

use crate::error::ApiError;
use crate::gateway::HistoryEntry;

/// `chunk` frame: one fragment of the reply
pub fn chunk_frame(text: &str, chat_id: &str) -> Value {
    serde_json::json!({
        "type": "chunk",
        "text": text,
        "chat_id": chat_id
    })
}

/// `complete` frame: the full reply and transcript
pub fn complete_frame(response: &str, chat_id: &str, history: &[HistoryEntry]) -> Value {
    serde_json::json!({
        "type": "complete",
        "response": response,
        "chat_id": chat_id,
        "history": history
    })
}

/// `error` frame; the HTTP status is already sent at this point
pub fn error_frame(error: &ApiError) -> Value {
    serde_json::json!({
        "type": "error",
        "error": error.message,
        "code": error.code,
        "message": error.technical_message
    })
}

/// Wrap a frame as a `data:` event
pub fn into_event(frame: Value) -> Result<Event, Infallible> {
    Ok(Event::default().data(frame.to_string()))
}

/// Create a chunk SSE event carrying one fragment of the reply
pub fn create_chunk_event(text: &str, chat_id: &str) -> Result<Event, Infallible> {
    into_event(chunk_frame(text, chat_id))
}

/// Create the complete SSE event with the full reply and transcript
pub fn create_complete_event(
    response: &str,
    chat_id: &str,
    history: &[HistoryEntry],
) -> Result<Event, Infallible> {
    into_event(complete_frame(response, chat_id, history))
}
