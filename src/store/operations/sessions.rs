use chrono::{DateTime, Utc};
use tokio_postgres::{GenericClient, Row};

use crate::store::{
    error::Result,
    types::{ChatSession, SessionOverview},
};

const SESSION_COLUMNS: &str = "id, user_id, created_at, closed_at, gemini_session_id";

pub(crate) fn parse_session_row(row: &Row) -> ChatSession {
    ChatSession {
        id: row.get("id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        closed_at: row.get("closed_at"),
        gemini_session_id: row.get("gemini_session_id"),
    }
}

/// Look up a session by id
pub async fn find_session<C: GenericClient>(client: &C, id: &str) -> Result<Option<ChatSession>> {
    let sql = format!("SELECT {} FROM chat_sessions WHERE id = $1", SESSION_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;
    Ok(row.as_ref().map(parse_session_row))
}

/// Create the session row if missing; backfill `user_id` when it was unset
///
/// An existing `user_id` is never overwritten.
pub async fn upsert_session<C: GenericClient>(
    client: &C,
    id: &str,
    user_id: Option<&str>,
) -> Result<ChatSession> {
    let sql = format!(
        "INSERT INTO chat_sessions (id, user_id, created_at) VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET user_id = COALESCE(chat_sessions.user_id, EXCLUDED.user_id) \
         RETURNING {}",
        SESSION_COLUMNS
    );
    let row = client
        .query_one(sql.as_str(), &[&id, &user_id, &Utc::now()])
        .await?;
    Ok(parse_session_row(&row))
}

/// Mark a session closed; keeps the first close time. `None` if the id is unknown
pub async fn close_session<C: GenericClient>(
    client: &C,
    id: &str,
    closed_at: DateTime<Utc>,
) -> Result<Option<ChatSession>> {
    let sql = format!(
        "UPDATE chat_sessions SET closed_at = COALESCE(closed_at, $2) WHERE id = $1 RETURNING {}",
        SESSION_COLUMNS
    );
    let row = client.query_opt(sql.as_str(), &[&id, &closed_at]).await?;
    Ok(row.as_ref().map(parse_session_row))
}

/// A user's sessions, newest first, with message counts and first exchange
pub async fn list_sessions<C: GenericClient>(
    client: &C,
    user_id: &str,
) -> Result<Vec<SessionOverview>> {
    let sql = "SELECT s.id, s.user_id, s.created_at, s.closed_at, s.gemini_session_id, \
               (SELECT COUNT(*) FROM messages m WHERE m.chat_session_id = s.id) AS message_count, \
               (SELECT m.text FROM messages m WHERE m.chat_session_id = s.id AND m.role = 'user' \
                ORDER BY m.created_at, m.id LIMIT 1) AS first_user_text, \
               (SELECT m.text FROM messages m WHERE m.chat_session_id = s.id AND m.role = 'assistant' \
                ORDER BY m.created_at, m.id LIMIT 1) AS first_assistant_text \
               FROM chat_sessions s \
               WHERE s.user_id = $1 \
               ORDER BY s.created_at DESC";

    let rows = client.query(sql, &[&user_id]).await?;

    Ok(rows
        .iter()
        .map(|row| SessionOverview {
            session: parse_session_row(row),
            message_count: row.get("message_count"),
            first_user_text: row.get("first_user_text"),
            first_assistant_text: row.get("first_assistant_text"),
        })
        .collect())
}
