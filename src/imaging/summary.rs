//! Assistant messages recorded for analysed images

use crate::gateway::{FoodAnalysis, GlucoseAnalysis, ImageAnalysis};
use crate::store::AnalysisRecord;

pub fn glucose_summary(reading: &GlucoseAnalysis) -> String {
    format!(
        "Glucose reading: {} {}\n\n{}",
        reading.value,
        reading.unit,
        reading.analysis.trim()
    )
}

pub fn food_summary(meal: &FoodAnalysis) -> String {
    let calories = meal
        .calories
        .map(|c| format!("{} kcal", c))
        .unwrap_or_else(|| "unknown".to_string());
    let carbs = meal
        .carbs_g
        .map(|c| format!("{} g", c))
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "Meal: {}\nCalories: {}\nCarbs: {}\nRecommendation: {}\n\n{}",
        meal.meal_name, calories, carbs, meal.recommendation_level, meal.recommendation_text
    )
}

/// Summary text and the analytics row for one analysis
pub fn describe(analysis: &ImageAnalysis) -> (String, AnalysisRecord) {
    match analysis {
        ImageAnalysis::Glucose(reading) => (
            glucose_summary(reading),
            AnalysisRecord::Glucose {
                value: reading.value,
                unit: reading.unit.clone(),
            },
        ),
        ImageAnalysis::Food(meal) => (
            food_summary(meal),
            AnalysisRecord::Food {
                meal_name: meal.meal_name.clone(),
                calories: meal.calories,
                carbs_g: meal.carbs_g,
                recommendation_level: meal.recommendation_level,
                recommendation_text: meal.recommendation_text.clone(),
            },
        ),
    }
}
