//! Glucose dashboards: per-day buckets and period summaries
//!
//! Pure functions over readings already loaded from the store. Values are
//! averaged as stored; the unit of the first reading labels the whole window.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::GlucoseReading;

pub const DEFAULT_PERIOD_DAYS: i64 = 7;
pub const MAX_PERIOD_DAYS: i64 = 30;
pub const NO_READINGS_MESSAGE: &str = "No glucose readings found for this period";

/// Time window ending now and reaching `days` back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    pub days: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    /// `None` unless `1 <= days <= 30`
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Option<Self> {
        if !(1..=MAX_PERIOD_DAYS).contains(&days) {
            return None;
        }
        Some(Self {
            days,
            start: end - Duration::days(days),
            end,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingPoint {
    pub value: f64,
    pub unit: String,
    pub taken_at: DateTime<Utc>,
}

/// One calendar day (UTC) of readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyGlucose {
    pub date: NaiveDate,
    pub day_name: String,
    pub average_value: f64,
    pub unit: String,
    pub reading_count: usize,
    pub readings: Vec<ReadingPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyGlucose {
    pub user_id: String,
    pub period_days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_data: Vec<DailyGlucose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucoseSummary {
    pub user_id: String,
    pub period_days: i64,
    pub total_readings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Group readings by UTC day, oldest day first
pub fn daily_breakdown(
    user_id: &str,
    period: &Period,
    readings: &[GlucoseReading],
) -> WeeklyGlucose {
    let mut weekly = WeeklyGlucose {
        user_id: user_id.to_string(),
        period_days: period.days,
        start_date: period.start.date_naive(),
        end_date: period.end.date_naive(),
        daily_data: Vec::new(),
        message: None,
    };

    let Some(first) = readings.first() else {
        weekly.message = Some(NO_READINGS_MESSAGE.to_string());
        return weekly;
    };
    let unit = first.unit.clone();

    let mut days: BTreeMap<NaiveDate, Vec<ReadingPoint>> = BTreeMap::new();
    for reading in readings {
        days.entry(reading.taken_at.date_naive())
            .or_default()
            .push(ReadingPoint {
                value: reading.value,
                unit: reading.unit.clone(),
                taken_at: reading.taken_at,
            });
    }

    weekly.daily_data = days
        .into_iter()
        .map(|(date, points)| DailyGlucose {
            date,
            day_name: date.format("%A").to_string(),
            average_value: round2(mean(points.iter().map(|p| p.value))),
            unit: unit.clone(),
            reading_count: points.len(),
            readings: points,
        })
        .collect();

    weekly
}

/// Count, mean, min and max over the period
pub fn summarize(user_id: &str, period: &Period, readings: &[GlucoseReading]) -> GlucoseSummary {
    let mut summary = GlucoseSummary {
        user_id: user_id.to_string(),
        period_days: period.days,
        total_readings: readings.len(),
        average_value: None,
        min_value: None,
        max_value: None,
        unit: None,
        message: None,
    };

    let Some(first) = readings.first() else {
        summary.message = Some(NO_READINGS_MESSAGE.to_string());
        return summary;
    };

    let values = || readings.iter().map(|r| r.value);
    summary.average_value = Some(round2(mean(values())));
    summary.min_value = Some(round2(values().fold(f64::INFINITY, f64::min)));
    summary.max_value = Some(round2(values().fold(f64::NEG_INFINITY, f64::max)));
    summary.unit = Some(first.unit.clone());
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(id: i64, taken_at: DateTime<Utc>, value: f64, unit: &str) -> GlucoseReading {
        GlucoseReading {
            id,
            user_id: Some("user-1".to_string()),
            chat_session_id: "chat-1".to_string(),
            message_id: id,
            image_path: None,
            value,
            unit: unit.to_string(),
            taken_at,
            created_at: taken_at,
        }
    }

    fn period() -> Period {
        Period::ending_at(Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap(), 7).unwrap()
    }

    #[test]
    fn test_period_bounds() {
        let end = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        assert!(Period::ending_at(end, 0).is_none());
        assert!(Period::ending_at(end, 31).is_none());

        let p = Period::ending_at(end, 30).unwrap();
        assert_eq!(p.start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_breakdown_groups_by_day() {
        let day1 = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2025, 1, 7, 9, 0, 0).unwrap();
        let readings = vec![
            reading(1, day1, 5.0, "mmol/L"),
            reading(2, day1 + Duration::hours(4), 6.0, "mmol/L"),
            reading(3, day2, 7.0, "mmol/L"),
        ];

        let weekly = daily_breakdown("user-1", &period(), &readings);

        assert_eq!(weekly.daily_data.len(), 2);
        assert!(weekly.message.is_none());

        let first = &weekly.daily_data[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(first.day_name, "Monday");
        assert_eq!(first.average_value, 5.5);
        assert_eq!(first.reading_count, 2);

        let second = &weekly.daily_data[1];
        assert_eq!(second.day_name, "Tuesday");
        assert_eq!(second.average_value, 7.0);
        assert_eq!(second.reading_count, 1);
    }

    #[test]
    fn test_daily_breakdown_uses_first_unit_and_rounds() {
        let day = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let readings = vec![
            reading(1, day, 100.0, "mg/dL"),
            reading(2, day, 101.0, "mmol/L"),
            reading(3, day, 101.0, "mg/dL"),
        ];

        let weekly = daily_breakdown("user-1", &period(), &readings);

        assert_eq!(weekly.daily_data[0].unit, "mg/dL");
        assert_eq!(weekly.daily_data[0].average_value, 100.67);
        assert_eq!(weekly.daily_data[0].readings[1].unit, "mmol/L");
    }

    #[test]
    fn test_daily_breakdown_empty() {
        let weekly = daily_breakdown("user-1", &period(), &[]);

        assert!(weekly.daily_data.is_empty());
        assert_eq!(weekly.message.as_deref(), Some(NO_READINGS_MESSAGE));
        assert_eq!(weekly.start_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(weekly.end_date, NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
    }

    #[test]
    fn test_summary() {
        let day = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        let readings = vec![
            reading(1, day, 4.8, "mmol/L"),
            reading(2, day, 6.1, "mmol/L"),
            reading(3, day, 5.0, "mmol/L"),
        ];

        let summary = summarize("user-1", &period(), &readings);

        assert_eq!(summary.total_readings, 3);
        assert_eq!(summary.average_value, Some(5.3));
        assert_eq!(summary.min_value, Some(4.8));
        assert_eq!(summary.max_value, Some(6.1));
        assert_eq!(summary.unit.as_deref(), Some("mmol/L"));
    }

    #[test]
    fn test_summary_empty_has_message_and_no_stats() {
        let summary = summarize("user-1", &period(), &[]);

        assert_eq!(summary.total_readings, 0);
        assert_eq!(summary.message.as_deref(), Some(NO_READINGS_MESSAGE));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_readings"], 0);
        assert!(json.get("average_value").is_none());
    }
}
