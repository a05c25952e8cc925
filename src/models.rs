// Request and response bodies of the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{FoodAnalysis, GlucoseAnalysis, HistoryEntry, ImageAnalysis, RecommendationLevel};
use crate::store::{SessionOverview, StoredMessage};

/// Longest preview snippet shown in session lists, in characters
const PREVIEW_CHARS: usize = 100;

// Chat

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_true")]
    pub include_history: bool,
}

impl Default for ChatQuery {
    fn default() -> Self {
        Self {
            stream: false,
            include_history: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub chat_id: String,
    pub history: Vec<HistoryEntry>,
}

// Sessions

#[derive(Debug, Clone, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionPreview {
    pub user_query: Option<String>,
    pub ai_response_snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub chat_id: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub message_count: i64,
    pub preview: SessionPreview,
}

impl From<SessionOverview> for SessionSummary {
    fn from(overview: SessionOverview) -> Self {
        Self {
            chat_id: overview.session.id,
            created_at: overview.session.created_at,
            closed_at: overview.session.closed_at,
            message_count: overview.message_count,
            preview: SessionPreview {
                user_query: overview.first_user_text.filter(|t| !t.is_empty()),
                ai_response_snippet: overview
                    .first_assistant_text
                    .as_deref()
                    .map(|t| snippet(t, PREVIEW_CHARS)),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
    pub total_sessions: usize,
}

/// Persisted transcript entry
#[derive(Debug, Clone, Serialize)]
pub struct StoredHistoryEntry {
    pub role: String,
    pub text: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StoredMessage> for StoredHistoryEntry {
    fn from(message: StoredMessage) -> Self {
        Self {
            role: message.role.to_string(),
            text: message.text,
            image_path: message.image_path,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionHistoryResponse {
    pub chat_id: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub history: Vec<StoredHistoryEntry>,
    pub total_messages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSessionResponse {
    pub chat_id: String,
    pub deleted: bool,
    pub closed_at: Option<DateTime<Utc>>,
}

// Images

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQuery {
    pub health_context: Option<String>,
    pub chat_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingBody {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealBody {
    pub meal_name: String,
    pub calories: Option<i32>,
    pub carbs_g: Option<f64>,
}

/// Type-specific part of an image analysis response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisBody {
    Glucose {
        reading: ReadingBody,
        analysis: String,
        raw_response: String,
    },
    Food {
        meal: MealBody,
        recommendation_level: RecommendationLevel,
        recommendation: String,
        raw_response: String,
    },
}

impl From<GlucoseAnalysis> for AnalysisBody {
    fn from(result: GlucoseAnalysis) -> Self {
        AnalysisBody::Glucose {
            reading: ReadingBody {
                value: result.value,
                unit: result.unit,
            },
            analysis: result.analysis,
            raw_response: result.raw_response,
        }
    }
}

impl From<FoodAnalysis> for AnalysisBody {
    fn from(result: FoodAnalysis) -> Self {
        AnalysisBody::Food {
            meal: MealBody {
                meal_name: result.meal_name,
                calories: result.calories,
                carbs_g: result.carbs_g,
            },
            recommendation_level: result.recommendation_level,
            recommendation: result.recommendation_text,
            raw_response: result.raw_response,
        }
    }
}

impl From<ImageAnalysis> for AnalysisBody {
    fn from(analysis: ImageAnalysis) -> Self {
        match analysis {
            ImageAnalysis::Glucose(result) => result.into(),
            ImageAnalysis::Food(result) => result.into(),
        }
    }
}

/// `analyze-glucose` / `analyze-food` response; the `type` tag is left out
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(flatten)]
    pub body: AnalysisBody,
}

impl AnalysisResponse {
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.remove("type");
        }
        value
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeImageResponse {
    pub success: bool,
    pub chat_id: String,
    pub image_path: String,
    #[serde(flatten)]
    pub body: AnalysisBody,
}

// Analytics

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsQuery {
    pub user_id: String,
    pub days: Option<i64>,
}

// Service

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// First `max_chars` characters, with `...` when cut
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChatSession, MessageRole};

    #[test]
    fn test_chat_request_deserialization() {
        let json = r#"{"message": "hi"}"#;
        let request: ChatRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.message, "hi");
        assert!(request.chat_id.is_none());
        assert!(request.user_id.is_none());

        assert!(serde_json::from_str::<ChatRequest>(r#"{"chat_id": "x"}"#).is_err());
    }

    #[test]
    fn test_chat_query_defaults() {
        let query: ChatQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.stream);
        assert!(query.include_history);
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("abcdef", 3), "abc...");
        assert_eq!(snippet("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_session_summary_from_overview() {
        let overview = SessionOverview {
            session: ChatSession {
                id: "chat-1".to_string(),
                user_id: Some("user-1".to_string()),
                created_at: Utc::now(),
                closed_at: None,
                gemini_session_id: None,
            },
            message_count: 4,
            first_user_text: Some(String::new()),
            first_assistant_text: Some("a".repeat(150)),
        };

        let summary = SessionSummary::from(overview);
        assert_eq!(summary.chat_id, "chat-1");
        assert_eq!(summary.message_count, 4);
        assert!(summary.preview.user_query.is_none());
        assert_eq!(
            summary.preview.ai_response_snippet.unwrap().chars().count(),
            103
        );
    }

    #[test]
    fn test_stored_history_entry_role() {
        let entry = StoredHistoryEntry::from(StoredMessage {
            id: 1,
            chat_session_id: "chat-1".to_string(),
            role: MessageRole::Assistant,
            text: "hello".to_string(),
            image_path: None,
            created_at: Utc::now(),
        });
        assert_eq!(entry.role, "assistant");
    }

    #[test]
    fn test_analyze_image_response_shape() {
        let response = AnalyzeImageResponse {
            success: true,
            chat_id: "chat-1".to_string(),
            image_path: "media/chat_images/a.jpg".to_string(),
            body: AnalysisBody::Glucose {
                reading: ReadingBody {
                    value: 125.0,
                    unit: "mg/dL".to_string(),
                },
                analysis: "Fine.".to_string(),
                raw_response: "125 mg/dL".to_string(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "glucose");
        assert_eq!(json["reading"]["value"], 125.0);
        assert_eq!(json["chat_id"], "chat-1");
    }

    #[test]
    fn test_food_response_without_type_tag() {
        let response = AnalysisResponse {
            success: true,
            body: AnalysisBody::Food {
                meal: MealBody {
                    meal_name: "Rice".to_string(),
                    calories: Some(300),
                    carbs_g: None,
                },
                recommendation_level: RecommendationLevel::Careful,
                recommendation: "Small portion.".to_string(),
                raw_response: "{}".to_string(),
            },
        };

        let json = response.to_json();
        assert!(json.get("type").is_none());
        assert_eq!(json["recommendation_level"], "CAREFUL");
        assert_eq!(json["meal"]["calories"], 300);
        assert!(json["meal"]["carbs_g"].is_null());
    }
}
