use chrono::Utc;
use tokio_postgres::{GenericClient, Row};

use crate::store::{
    error::{Error, Result},
    types::{NewMessage, StoredMessage},
};

pub(crate) fn parse_message_row(row: &Row) -> Result<StoredMessage> {
    let role: String = row.get("role");
    let role = role
        .parse()
        .map_err(|e: String| Error::DatabaseError(format!("Invalid role in database: {}", e)))?;

    Ok(StoredMessage {
        id: row.get("id"),
        chat_session_id: row.get("chat_session_id"),
        role,
        text: row.get("text"),
        image_path: row.get("image_path"),
        created_at: row.get("created_at"),
    })
}

/// Insert one message stamped with the current time
pub async fn insert_message<C: GenericClient>(
    client: &C,
    message: &NewMessage<'_>,
) -> Result<StoredMessage> {
    let row = client
        .query_one(
            "INSERT INTO messages (chat_session_id, role, text, image_path, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, chat_session_id, role, text, image_path, created_at",
            &[
                &message.chat_session_id,
                &message.role.as_str(),
                &message.text,
                &message.image_path,
                &Utc::now(),
            ],
        )
        .await?;
    parse_message_row(&row)
}

/// Messages of one session in conversation order
pub async fn session_messages<C: GenericClient>(
    client: &C,
    chat_session_id: &str,
) -> Result<Vec<StoredMessage>> {
    let rows = client
        .query(
            "SELECT id, chat_session_id, role, text, image_path, created_at \
             FROM messages WHERE chat_session_id = $1 \
             ORDER BY created_at, id",
            &[&chat_session_id],
        )
        .await?;

    rows.iter().map(parse_message_row).collect()
}
