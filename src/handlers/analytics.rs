// Glucose dashboard handlers

use chrono::Utc;
use std::convert::Infallible;
use tracing::info;
use warp::reply::Response;
use warp::Reply;

use crate::analytics::{self, Period, DEFAULT_PERIOD_DAYS, MAX_PERIOD_DAYS};
use crate::error::ApiError;
use crate::models::AnalyticsQuery;
use crate::state::AppState;
use crate::store::GlucoseReading;

fn period_for(query: &AnalyticsQuery) -> Result<Period, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_PERIOD_DAYS);
    Period::ending_at(Utc::now(), days).ok_or_else(|| {
        ApiError::bad_request(format!("days must be between 1 and {}", MAX_PERIOD_DAYS))
    })
}

async fn load(
    query: &AnalyticsQuery,
    state: &AppState,
) -> Result<(Period, Vec<GlucoseReading>), ApiError> {
    let period = period_for(query)?;
    let readings = state
        .db
        .glucose_readings(&query.user_id, period.start, period.end)
        .await?;
    Ok((period, readings))
}

/// GET /api/analytics/glucose/weekly?user_id=&days=
pub async fn weekly_glucose_handler(
    query: AnalyticsQuery,
    state: AppState,
) -> Result<Response, Infallible> {
    info!(user_id = %query.user_id, days = ?query.days, "GET /api/analytics/glucose/weekly");

    Ok(match load(&query, &state).await {
        Ok((period, readings)) => {
            warp::reply::json(&analytics::daily_breakdown(&query.user_id, &period, &readings))
                .into_response()
        }
        Err(e) => e.into_response(),
    })
}

/// GET /api/analytics/glucose/summary?user_id=&days=
pub async fn glucose_summary_handler(
    query: AnalyticsQuery,
    state: AppState,
) -> Result<Response, Infallible> {
    info!(user_id = %query.user_id, days = ?query.days, "GET /api/analytics/glucose/summary");

    Ok(match load(&query, &state).await {
        Ok((period, readings)) => {
            warp::reply::json(&analytics::summarize(&query.user_id, &period, &readings))
                .into_response()
        }
        Err(e) => e.into_response(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(days: Option<i64>) -> AnalyticsQuery {
        AnalyticsQuery {
            user_id: "user-1".to_string(),
            days,
        }
    }

    #[test]
    fn test_period_defaults_to_a_week() {
        assert_eq!(period_for(&query(None)).unwrap().days, 7);
        assert_eq!(period_for(&query(Some(30))).unwrap().days, 30);
    }

    #[test]
    fn test_period_out_of_range() {
        let err = period_for(&query(Some(0))).unwrap_err();
        assert_eq!(err.status, warp::http::StatusCode::BAD_REQUEST);
        assert!(period_for(&query(Some(31))).is_err());
    }
}
