//! Row types for the application tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::gateway::RecommendationLevel;

/// One conversation (`chat_sessions`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Internal model-session reference
    pub gemini_session_id: Option<String>,
}

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("Unknown message role: {}", other)),
        }
    }
}

/// A persisted conversation turn (`messages`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub chat_session_id: String,
    pub role: MessageRole,
    /// Empty for image-only turns
    pub text: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Message to insert
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub chat_session_id: &'a str,
    pub role: MessageRole,
    pub text: &'a str,
    pub image_path: Option<&'a str>,
}

/// Value extracted from a glucose meter photo (`glucose_readings`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub id: i64,
    pub user_id: Option<String>,
    pub chat_session_id: String,
    /// Assistant message that reported the value
    pub message_id: i64,
    pub image_path: Option<String>,
    pub value: f64,
    /// Free-form, not normalised across units
    pub unit: String,
    pub taken_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Meal extracted from a food photo (`food_events`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEvent {
    pub id: i64,
    pub user_id: Option<String>,
    pub chat_session_id: String,
    pub message_id: i64,
    pub image_path: Option<String>,
    pub meal_name: String,
    pub calories: Option<i32>,
    pub carbs_g: Option<f64>,
    pub recommendation_level: Option<RecommendationLevel>,
    pub recommendation_text: Option<String>,
    /// Most recent reading of the same user when the meal was logged
    pub glucose_reading_id: Option<i64>,
    pub eaten_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Session with the counts and snippets shown in session lists
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOverview {
    pub session: ChatSession,
    pub message_count: i64,
    pub first_user_text: Option<String>,
    pub first_assistant_text: Option<String>,
}

/// Structured fact produced by an image analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRecord {
    Glucose {
        value: f64,
        unit: String,
    },
    Food {
        meal_name: String,
        calories: Option<i32>,
        carbs_g: Option<f64>,
        recommendation_level: RecommendationLevel,
        recommendation_text: String,
    },
}

/// Everything written for one analysed image
#[derive(Debug, Clone)]
pub struct NewImageAnalysis {
    /// Existing or client-chosen session id; a new one is generated when absent
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    /// Relative path of the stored image
    pub image_path: String,
    /// Assistant summary text
    pub summary: String,
    pub record: AnalysisRecord,
}

/// Ids of the rows written for one analysed image
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedImageAnalysis {
    pub session_id: String,
    pub user_message_id: i64,
    pub assistant_message_id: i64,
    pub glucose_reading_id: Option<i64>,
    pub food_event_id: Option<i64>,
    /// Reading the food event points at, if any
    pub linked_glucose_reading_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_round_trip() {
        assert_eq!("user".parse::<MessageRole>(), Ok(MessageRole::User));
        assert_eq!("assistant".parse::<MessageRole>(), Ok(MessageRole::Assistant));
        assert!("model".parse::<MessageRole>().is_err());
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }
}
