// Session listing, persisted history and closing

use std::convert::Infallible;
use tracing::info;
use warp::reply::Response;
use warp::Reply;

use crate::error::ApiError;
use crate::models::{
    DeleteSessionResponse, SessionHistoryResponse, SessionListResponse, SessionSummary,
    StoredHistoryEntry, UserQuery,
};
use crate::state::AppState;

/// GET /api/chat/sessions?user_id=
pub async fn list_sessions_handler(
    query: UserQuery,
    state: AppState,
) -> Result<Response, Infallible> {
    info!(user_id = %query.user_id, "GET /api/chat/sessions");

    let sessions: Vec<SessionSummary> = match state.db.list_sessions(&query.user_id).await {
        Ok(overviews) => overviews.into_iter().map(SessionSummary::from).collect(),
        Err(e) => return Ok(ApiError::from(e).into_response()),
    };

    Ok(warp::reply::json(&SessionListResponse {
        total_sessions: sessions.len(),
        sessions,
    })
    .into_response())
}

/// GET /api/chat/{chat_id}/history
pub async fn session_history_handler(
    chat_id: String,
    state: AppState,
) -> Result<Response, Infallible> {
    info!(chat_id = %chat_id, "GET /api/chat/{{chat_id}}/history");

    let session = match state.db.get_session(&chat_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return Ok(ApiError::not_found(format!("Chat session {} not found", chat_id))
                .into_response())
        }
        Err(e) => return Ok(ApiError::from(e).into_response()),
    };

    let history: Vec<StoredHistoryEntry> = match state.db.session_messages(&chat_id).await {
        Ok(messages) => messages.into_iter().map(StoredHistoryEntry::from).collect(),
        Err(e) => return Ok(ApiError::from(e).into_response()),
    };

    Ok(warp::reply::json(&SessionHistoryResponse {
        chat_id: session.id,
        user_id: session.user_id,
        created_at: session.created_at,
        total_messages: history.len(),
        history,
    })
    .into_response())
}

/// DELETE /api/chat/{chat_id}
pub async fn delete_session_handler(
    chat_id: String,
    state: AppState,
) -> Result<Response, Infallible> {
    info!(chat_id = %chat_id, "DELETE /api/chat/{{chat_id}}");

    let dropped = state.gateway.delete_session(&chat_id).await;
    let closed = match state.db.close_session(&chat_id).await {
        Ok(closed) => closed,
        Err(e) => return Ok(ApiError::from(e).into_response()),
    };

    if !dropped && closed.is_none() {
        return Ok(
            ApiError::not_found(format!("Chat session {} not found", chat_id)).into_response(),
        );
    }

    Ok(warp::reply::json(&DeleteSessionResponse {
        chat_id,
        deleted: true,
        closed_at: closed.and_then(|session| session.closed_at),
    })
    .into_response())
}
