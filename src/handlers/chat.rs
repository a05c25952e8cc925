// POST /api/chat handler

use futures_util::StreamExt;
use serde_json::Value;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};
use warp::reply::Response;
use warp::Reply;

use crate::error::ApiError;
use crate::gateway::{Gateway, HistoryEntry};
use crate::models::{ChatQuery, ChatRequest, ChatResponse};
use crate::sse::{
    self, chunk_frame, complete_frame, create_chunk_event, create_complete_event, error_frame,
};
use crate::state::AppState;
use crate::store::DbClient;

pub const GREETING: &str = "Hello! Welcome back to HealthStake. I'm your personal diabetes assistant. How can I help you today?";

const GREETING_WORDS: [&str; 4] = ["", "hi", "hello", "hey"];

/// A bare greeting on a new conversation is answered without the model
pub fn wants_greeting(request: &ChatRequest) -> bool {
    let has_chat = request
        .chat_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    !has_chat && GREETING_WORDS.contains(&request.message.trim().to_lowercase().as_str())
}

pub async fn chat_handler(
    query: ChatQuery,
    request: ChatRequest,
    state: AppState,
) -> Result<Response, Infallible> {
    info!(
        stream = query.stream,
        chat_id = ?request.chat_id,
        user_id = ?request.user_id,
        "POST /api/chat"
    );

    if wants_greeting(&request) {
        let chat_id = state.gateway.create_session(None).await;
        return Ok(greeting_reply(query.stream, chat_id));
    }

    if request.message.trim().is_empty() {
        return Ok(ApiError::bad_request("Message must not be empty").into_response());
    }

    let chat_id = request
        .chat_id
        .clone()
        .filter(|id| !id.trim().is_empty());

    if query.stream {
        return Ok(stream_reply(state, request, chat_id));
    }

    let reply = match state
        .gateway
        .send_message(&request.message, chat_id.as_deref())
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, technical = %e.technical_message(), "Chat turn failed");
            return Ok(ApiError::from_chat(e).into_response());
        }
    };

    persist_turn(
        &state.db,
        &reply.session_id,
        request.user_id.as_deref(),
        &request.message,
        &reply.text,
    )
    .await;

    let history = if query.include_history {
        history_or_empty(&state.gateway, &reply.session_id).await
    } else {
        Vec::new()
    };

    Ok(warp::reply::json(&ChatResponse {
        response: reply.text,
        chat_id: reply.session_id,
        history,
    })
    .into_response())
}

fn greeting_reply(stream: bool, chat_id: String) -> Response {
    if !stream {
        return warp::reply::json(&ChatResponse {
            response: GREETING.to_string(),
            chat_id,
            history: Vec::new(),
        })
        .into_response();
    }

    let events = futures_util::stream::iter(vec![
        create_chunk_event(GREETING, &chat_id),
        create_complete_event(GREETING, &chat_id, &[]),
    ]);
    warp::sse::reply(warp::sse::keep_alive().stream(events)).into_response()
}

/// Frames buffered between the turn task and the SSE response
const STREAM_BUFFER: usize = 32;

fn stream_reply(state: AppState, request: ChatRequest, chat_id: Option<String>) -> Response {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(run_streamed_turn(state, request, chat_id, tx));

    let events = ReceiverStream::new(rx).map(sse::into_event);
    warp::sse::reply(warp::sse::keep_alive().stream(events)).into_response()
}

/// Drive one streamed turn, sending frames until done or the receiver is dropped
///
/// Frames are `chunk`* then `complete`, or `chunk`* then `error`. The turn is
/// stored only when the model stream completed and the receiver is still open.
pub async fn run_streamed_turn(
    state: AppState,
    request: ChatRequest,
    chat_id: Option<String>,
    tx: mpsc::Sender<Value>,
) {
    let mut chunks = state
        .gateway
        .send_message_stream(request.message.clone(), chat_id);
    let mut full_response = String::new();
    let mut resolved_id = None;

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(chunk) => {
                full_response.push_str(&chunk.text);
                if tx
                    .send(chunk_frame(&chunk.text, &chunk.session_id))
                    .await
                    .is_err()
                {
                    debug!(chat_id = %chunk.session_id, "Client disconnected mid-stream");
                    return;
                }
                resolved_id = Some(chunk.session_id);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    technical = %e.technical_message(),
                    "Streamed chat turn failed"
                );
                let _ = tx.send(error_frame(&ApiError::from_chat(e))).await;
                return;
            }
        }
    }
    // Releases the session for the history read below
    drop(chunks);

    let Some(chat_id) = resolved_id else {
        return;
    };
    if tx.is_closed() {
        debug!(chat_id = %chat_id, "Client disconnected before completion");
        return;
    }

    persist_turn(
        &state.db,
        &chat_id,
        request.user_id.as_deref(),
        &request.message,
        &full_response,
    )
    .await;
    let history = history_or_empty(&state.gateway, &chat_id).await;
    let _ = tx
        .send(complete_frame(&full_response, &chat_id, &history))
        .await;
}

async fn history_or_empty(gateway: &Gateway, chat_id: &str) -> Vec<HistoryEntry> {
    gateway.get_history(chat_id).await.unwrap_or_else(|e| {
        warn!(chat_id = %chat_id, error = %e, "History retrieval failed");
        Vec::new()
    })
}

/// Failures are logged; the chat reply is still returned
async fn persist_turn(
    db: &DbClient,
    chat_id: &str,
    user_id: Option<&str>,
    user_text: &str,
    assistant_text: &str,
) {
    if let Err(e) = db
        .record_chat_turn(chat_id, user_id, user_text, assistant_text)
        .await
    {
        error!(chat_id = %chat_id, error = %e, "Failed to store chat turn");
    }
}
