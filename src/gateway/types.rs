//! Results returned by the gateway

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reply to a non-streamed chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    /// Authoritative session id (may differ from the one sent)
    pub session_id: String,
}

/// One streamed fragment of a chat reply
#[derive(Debug, Clone, PartialEq)]
pub struct ChatChunk {
    pub text: String,
    pub session_id: String,
}

/// Visible transcript entry; `role` is `user` or `model`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub text: String,
}

/// Meal suitability verdict for a diabetic patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationLevel {
    Yes,
    Careful,
    No,
}

impl RecommendationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationLevel::Yes => "YES",
            RecommendationLevel::Careful => "CAREFUL",
            RecommendationLevel::No => "NO",
        }
    }
}

impl fmt::Display for RecommendationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "YES" => Ok(RecommendationLevel::Yes),
            "CAREFUL" => Ok(RecommendationLevel::Careful),
            "NO" => Ok(RecommendationLevel::No),
            other => Err(format!("Unknown recommendation level: {}", other)),
        }
    }
}

/// Reading extracted from a glucose meter photo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucoseAnalysis {
    pub value: f64,
    pub unit: String,
    /// Short clinical comment on the reading
    pub analysis: String,
    /// Verbatim extraction reply
    pub raw_response: String,
}

/// Meal details extracted from a food photo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodAnalysis {
    pub meal_name: String,
    pub calories: Option<i32>,
    pub recommendation_level: RecommendationLevel,
    pub recommendation_text: String,
    pub carbs_g: Option<f64>,
    pub raw_response: String,
}

/// What an uploaded photo shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Glucose,
    Food,
}

/// Result of automatic classification plus extraction
#[derive(Debug, Clone, PartialEq)]
pub enum ImageAnalysis {
    Glucose(GlucoseAnalysis),
    Food(FoodAnalysis),
}

impl ImageAnalysis {
    pub fn kind(&self) -> ImageKind {
        match self {
            ImageAnalysis::Glucose(_) => ImageKind::Glucose,
            ImageAnalysis::Food(_) => ImageKind::Food,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_level_parse() {
        assert_eq!("yes".parse::<RecommendationLevel>(), Ok(RecommendationLevel::Yes));
        assert_eq!(" Careful ".parse::<RecommendationLevel>(), Ok(RecommendationLevel::Careful));
        assert_eq!("NO".parse::<RecommendationLevel>(), Ok(RecommendationLevel::No));
        assert!("MAYBE".parse::<RecommendationLevel>().is_err());
    }

    #[test]
    fn test_recommendation_level_serialization() {
        let json = serde_json::to_string(&RecommendationLevel::Careful).unwrap();
        assert_eq!(json, "\"CAREFUL\"");
        assert_eq!(RecommendationLevel::No.to_string(), "NO");
    }
}
