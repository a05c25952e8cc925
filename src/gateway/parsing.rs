//! Typed parsing of semi-structured model replies
//!
//! Each reply kind has an ordered list of strategies. A strategy returns
//! `None` when it does not recognise the text and the next one is tried.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::types::{FoodAnalysis, ImageKind, RecommendationLevel};

static GLUCOSE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+\.?\d*)\s*(mg/dL|mmol/L)").expect("valid regex"));
static MEAL_NAME_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)meal_name[:=]\s*(.+?)(?:\n|$)").expect("valid regex"));
static CALORIES_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)calories[:=]\s*(\d+)").expect("valid regex"));
static LEVEL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(YES|CAREFUL|NO)\b").expect("valid regex"));
static RECOMMENDATION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)recommendation[_:\-]\s*(.+)").expect("valid regex"));

const UNIDENTIFIED_MEAL: &str = "Unidentified Meal";
const NO_RECOMMENDATION: &str = "Recommendation not available.";

/// Value and unit read off a meter display
#[derive(Debug, Clone, PartialEq)]
pub struct GlucoseValue {
    pub value: f64,
    pub unit: String,
}

/// Outcome of one glucose strategy
#[derive(Debug, Clone, PartialEq)]
pub enum GlucoseVerdict {
    Reading(GlucoseValue),
    /// The model said it could not read the display
    Unreadable,
}

/// Why a glucose reply did not yield a value
#[derive(Debug, Clone, PartialEq)]
pub enum GlucoseParseError {
    /// The model declined to read the display
    Declined,
    /// No `VALUE UNIT` pair was found
    NoMatch,
}

trait GlucoseStrategy: Sync {
    fn apply(&self, reply: &str) -> Option<GlucoseVerdict>;
}

/// Refusal wording ("unable", "cannot") wins over any number in the reply
struct RefusalMarker;

impl GlucoseStrategy for RefusalMarker {
    fn apply(&self, reply: &str) -> Option<GlucoseVerdict> {
        let lower = reply.to_lowercase();
        (lower.contains("unable") || lower.contains("cannot")).then_some(GlucoseVerdict::Unreadable)
    }
}

struct ValueWithUnit;

impl GlucoseStrategy for ValueWithUnit {
    fn apply(&self, reply: &str) -> Option<GlucoseVerdict> {
        let captures = GLUCOSE_VALUE.captures(reply)?;
        let value = captures[1].parse::<f64>().ok()?;
        Some(GlucoseVerdict::Reading(GlucoseValue {
            value,
            unit: canonical_unit(&captures[2]).to_string(),
        }))
    }
}

static GLUCOSE_STRATEGIES: [&dyn GlucoseStrategy; 2] = [&RefusalMarker, &ValueWithUnit];

fn canonical_unit(raw: &str) -> &'static str {
    if raw.eq_ignore_ascii_case("mmol/L") {
        "mmol/L"
    } else {
        "mg/dL"
    }
}

/// Parse the reply to the glucose extraction prompt
pub fn parse_glucose_reply(reply: &str) -> Result<GlucoseValue, GlucoseParseError> {
    for strategy in GLUCOSE_STRATEGIES.iter() {
        match strategy.apply(reply) {
            Some(GlucoseVerdict::Reading(value)) => return Ok(value),
            Some(GlucoseVerdict::Unreadable) => return Err(GlucoseParseError::Declined),
            None => continue,
        }
    }
    Err(GlucoseParseError::NoMatch)
}

/// Fields recovered from a food reply before defaults are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealFields {
    pub meal_name: Option<String>,
    pub calories: Option<i32>,
    pub recommendation_level: Option<RecommendationLevel>,
    pub recommendation_text: Option<String>,
    pub carbs_g: Option<f64>,
}

impl MealFields {
    /// Keep fields already found; take the rest from `other`
    fn fill_missing(&mut self, other: MealFields) {
        self.meal_name = self.meal_name.take().or(other.meal_name);
        self.calories = self.calories.or(other.calories);
        self.recommendation_level = self.recommendation_level.or(other.recommendation_level);
        self.recommendation_text = self.recommendation_text.take().or(other.recommendation_text);
        self.carbs_g = self.carbs_g.or(other.carbs_g);
    }

    fn is_complete(&self) -> bool {
        self.meal_name.is_some()
            && self.calories.is_some()
            && self.recommendation_level.is_some()
            && self.recommendation_text.is_some()
    }
}

trait MealStrategy: Sync {
    fn extract(&self, reply: &str) -> Option<MealFields>;
}

/// The reply is the JSON object the prompt asked for
struct StrictJson;

impl MealStrategy for StrictJson {
    fn extract(&self, reply: &str) -> Option<MealFields> {
        let parsed: Value = serde_json::from_str(reply.trim()).ok()?;
        let object = parsed.as_object()?;

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(MealFields {
            meal_name: text("meal_name"),
            calories: object
                .get("calories")
                .and_then(Value::as_f64)
                .map(|c| c.round() as i32),
            recommendation_level: text("recommendation_level").and_then(|l| l.parse().ok()),
            recommendation_text: text("recommendation_text"),
            carbs_g: object.get("carbs_g").and_then(Value::as_f64),
        })
    }
}

/// Loose `key: value` scanning for replies that are not valid JSON
struct FieldScan;

impl MealStrategy for FieldScan {
    fn extract(&self, reply: &str) -> Option<MealFields> {
        let fields = MealFields {
            meal_name: MEAL_NAME_FIELD
                .captures(reply)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty()),
            calories: CALORIES_FIELD
                .captures(reply)
                .and_then(|c| c[1].parse::<i32>().ok()),
            recommendation_level: LEVEL_WORD
                .captures(reply)
                .and_then(|c| c[1].parse().ok()),
            recommendation_text: RECOMMENDATION_FIELD
                .captures(reply)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty()),
            carbs_g: None,
        };
        (fields != MealFields::default()).then_some(fields)
    }
}

static MEAL_STRATEGIES: [&dyn MealStrategy; 2] = [&StrictJson, &FieldScan];

/// Parse the reply to the food prompt; never fails, missing fields get defaults
pub fn parse_food_reply(reply: &str) -> FoodAnalysis {
    let mut fields = MealFields::default();
    for strategy in MEAL_STRATEGIES.iter() {
        if fields.is_complete() {
            break;
        }
        if let Some(found) = strategy.extract(reply) {
            fields.fill_missing(found);
        }
    }

    FoodAnalysis {
        meal_name: fields
            .meal_name
            .unwrap_or_else(|| UNIDENTIFIED_MEAL.to_string()),
        calories: fields.calories,
        recommendation_level: fields
            .recommendation_level
            .unwrap_or(RecommendationLevel::Careful),
        recommendation_text: fields
            .recommendation_text
            .unwrap_or_else(|| NO_RECOMMENDATION.to_string()),
        carbs_g: fields.carbs_g,
        raw_response: reply.to_string(),
    }
}

/// Map the classification reply to an image kind; `None` when undeterminable
pub fn classify_reply(reply: &str) -> Option<ImageKind> {
    let upper = reply.trim().to_uppercase();
    if upper.contains("GLUCOSE") {
        Some(ImageKind::Glucose)
    } else if upper.contains("FOOD") {
        Some(ImageKind::Food)
    } else {
        None
    }
}
