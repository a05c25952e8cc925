//! Table definitions, applied idempotently at startup

use tokio_postgres::GenericClient;
use tracing::info;

use crate::store::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chat_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    closed_at TIMESTAMPTZ,
    gemini_session_id TEXT
);

CREATE INDEX IF NOT EXISTS chat_sessions_user_created_idx
    ON chat_sessions (user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS messages (
    id BIGSERIAL PRIMARY KEY,
    chat_session_id TEXT NOT NULL REFERENCES chat_sessions (id) ON DELETE CASCADE,
    role VARCHAR(16) NOT NULL CHECK (role IN ('user', 'assistant')),
    text TEXT NOT NULL DEFAULT '',
    image_path TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS messages_session_created_idx
    ON messages (chat_session_id, created_at, id);

CREATE TABLE IF NOT EXISTS glucose_readings (
    id BIGSERIAL PRIMARY KEY,
    user_id TEXT,
    chat_session_id TEXT NOT NULL REFERENCES chat_sessions (id) ON DELETE CASCADE,
    message_id BIGINT NOT NULL REFERENCES messages (id) ON DELETE CASCADE,
    image_path TEXT,
    value DOUBLE PRECISION NOT NULL,
    unit TEXT NOT NULL,
    taken_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS glucose_readings_user_taken_idx
    ON glucose_readings (user_id, taken_at DESC);

CREATE TABLE IF NOT EXISTS food_events (
    id BIGSERIAL PRIMARY KEY,
    user_id TEXT,
    chat_session_id TEXT NOT NULL REFERENCES chat_sessions (id) ON DELETE CASCADE,
    message_id BIGINT NOT NULL REFERENCES messages (id) ON DELETE CASCADE,
    image_path TEXT,
    meal_name TEXT NOT NULL,
    calories INTEGER,
    carbs_g DOUBLE PRECISION,
    recommendation_level VARCHAR(16) CHECK (recommendation_level IN ('YES', 'CAREFUL', 'NO')),
    recommendation_text TEXT,
    glucose_reading_id BIGINT REFERENCES glucose_readings (id) ON DELETE SET NULL,
    eaten_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS food_events_user_eaten_idx
    ON food_events (user_id, eaten_at DESC);
"#;

/// Create any missing tables and indexes
pub async fn migrate<C: GenericClient>(client: &C) -> Result<()> {
    client.batch_execute(SCHEMA).await?;
    info!("Database schema is up to date");
    Ok(())
}
