use chrono::{DateTime, Utc};
use tokio_postgres::{GenericClient, Row};

use crate::gateway::RecommendationLevel;
use crate::store::{
    error::{Error, Result},
    types::{FoodEvent, GlucoseReading},
};

const READING_COLUMNS: &str =
    "id, user_id, chat_session_id, message_id, image_path, value, unit, taken_at, created_at";

const FOOD_COLUMNS: &str = "id, user_id, chat_session_id, message_id, image_path, meal_name, \
     calories, carbs_g, recommendation_level, recommendation_text, glucose_reading_id, \
     eaten_at, created_at";

pub(crate) fn parse_reading_row(row: &Row) -> GlucoseReading {
    GlucoseReading {
        id: row.get("id"),
        user_id: row.get("user_id"),
        chat_session_id: row.get("chat_session_id"),
        message_id: row.get("message_id"),
        image_path: row.get("image_path"),
        value: row.get("value"),
        unit: row.get("unit"),
        taken_at: row.get("taken_at"),
        created_at: row.get("created_at"),
    }
}

pub(crate) fn parse_food_row(row: &Row) -> Result<FoodEvent> {
    let level: Option<String> = row.get("recommendation_level");
    let recommendation_level = level
        .map(|l| l.parse::<RecommendationLevel>())
        .transpose()
        .map_err(|e| Error::DatabaseError(format!("Invalid recommendation level: {}", e)))?;

    Ok(FoodEvent {
        id: row.get("id"),
        user_id: row.get("user_id"),
        chat_session_id: row.get("chat_session_id"),
        message_id: row.get("message_id"),
        image_path: row.get("image_path"),
        meal_name: row.get("meal_name"),
        calories: row.get("calories"),
        carbs_g: row.get("carbs_g"),
        recommendation_level,
        recommendation_text: row.get("recommendation_text"),
        glucose_reading_id: row.get("glucose_reading_id"),
        eaten_at: row.get("eaten_at"),
        created_at: row.get("created_at"),
    })
}

/// Glucose row to insert
#[derive(Debug, Clone)]
pub struct NewGlucoseReading<'a> {
    pub user_id: Option<&'a str>,
    pub chat_session_id: &'a str,
    pub message_id: i64,
    pub image_path: Option<&'a str>,
    pub value: f64,
    pub unit: &'a str,
    pub taken_at: DateTime<Utc>,
}

/// Food row to insert
#[derive(Debug, Clone)]
pub struct NewFoodEvent<'a> {
    pub user_id: Option<&'a str>,
    pub chat_session_id: &'a str,
    pub message_id: i64,
    pub image_path: Option<&'a str>,
    pub meal_name: &'a str,
    pub calories: Option<i32>,
    pub carbs_g: Option<f64>,
    pub recommendation_level: RecommendationLevel,
    pub recommendation_text: &'a str,
    pub glucose_reading_id: Option<i64>,
    pub eaten_at: DateTime<Utc>,
}

pub async fn insert_glucose_reading<C: GenericClient>(
    client: &C,
    reading: &NewGlucoseReading<'_>,
) -> Result<GlucoseReading> {
    let sql = format!(
        "INSERT INTO glucose_readings \
         (user_id, chat_session_id, message_id, image_path, value, unit, taken_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        READING_COLUMNS
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[
                &reading.user_id,
                &reading.chat_session_id,
                &reading.message_id,
                &reading.image_path,
                &reading.value,
                &reading.unit,
                &reading.taken_at,
                &Utc::now(),
            ],
        )
        .await?;
    Ok(parse_reading_row(&row))
}

pub async fn insert_food_event<C: GenericClient>(
    client: &C,
    event: &NewFoodEvent<'_>,
) -> Result<FoodEvent> {
    let sql = format!(
        "INSERT INTO food_events \
         (user_id, chat_session_id, message_id, image_path, meal_name, calories, carbs_g, \
          recommendation_level, recommendation_text, glucose_reading_id, eaten_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
        FOOD_COLUMNS
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[
                &event.user_id,
                &event.chat_session_id,
                &event.message_id,
                &event.image_path,
                &event.meal_name,
                &event.calories,
                &event.carbs_g,
                &event.recommendation_level.as_str(),
                &event.recommendation_text,
                &event.glucose_reading_id,
                &event.eaten_at,
                &Utc::now(),
            ],
        )
        .await?;
    parse_food_row(&row)
}

/// The user's most recent reading by `taken_at`
pub async fn latest_glucose_reading<C: GenericClient>(
    client: &C,
    user_id: &str,
) -> Result<Option<GlucoseReading>> {
    let sql = format!(
        "SELECT {} FROM glucose_readings WHERE user_id = $1 ORDER BY taken_at DESC, id DESC LIMIT 1",
        READING_COLUMNS
    );
    let row = client.query_opt(sql.as_str(), &[&user_id]).await?;
    Ok(row.as_ref().map(parse_reading_row))
}

/// Readings with `start <= taken_at <= end`, oldest first
pub async fn readings_between<C: GenericClient>(
    client: &C,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<GlucoseReading>> {
    let sql = format!(
        "SELECT {} FROM glucose_readings \
         WHERE user_id = $1 AND taken_at >= $2 AND taken_at <= $3 \
         ORDER BY taken_at, id",
        READING_COLUMNS
    );
    let rows = client.query(sql.as_str(), &[&user_id, &start, &end]).await?;
    Ok(rows.iter().map(parse_reading_row).collect())
}
