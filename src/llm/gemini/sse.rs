//! Server-Sent Events (SSE) parser for Gemini responses

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::{GenerateContentResponse, GoogleErrorResponse};

/// Parse a stream of bytes as Gemini SSE events
///
/// Gemini's SSE format uses `data: <json>` lines. This parser:
/// 1. Reads lines from the byte stream
/// 2. Filters for lines starting with "data:"
/// 3. Extracts and parses the JSON payload
/// 4. Returns a stream of parsed responses
///
/// A payload carrying a Google error envelope instead of a response becomes
/// `LlmError::ProviderError` so it classifies like an HTTP failure.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, LlmError>> + Send>> {
    // Raw bytes of the current partial line; a UTF-8 sequence may span chunks
    let mut buffer: Vec<u8> = Vec::new();

    let event_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend_from_slice(&chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();

            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    events.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if line.is_empty() {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                events.push(parse_data_line(data.trim_start()));
            }
            // Ignore other line types (event:, id:, etc.)
        }

        futures::stream::iter(events)
    });

    Box::pin(event_stream)
}

fn parse_data_line(data: &str) -> Result<GenerateContentResponse, LlmError> {
    if let Ok(envelope) = serde_json::from_str::<GoogleErrorResponse>(data) {
        return Err(LlmError::ProviderError {
            code: envelope.error.status,
            message: envelope.error.message,
        });
    }

    serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
        LlmError::SerializationError(format!("Failed to parse SSE data: {}. Data: {}", e, data))
    })
}
