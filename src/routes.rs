// Route definitions and handlers

use std::convert::Infallible;
use std::path::PathBuf;
use warp::Filter;

use crate::error::handle_rejection;
use crate::handlers;
use crate::models::{AnalyticsQuery, ChatQuery, ImageQuery, UserQuery};
use crate::state::AppState;

/// Largest accepted chat body
const MAX_JSON_BYTES: u64 = 64 * 1024;

/// Route settings that are not per-request state
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub media_root: PathBuf,
    pub max_upload_bytes: u64,
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn configure_routes(
    state: AppState,
    config: RouteConfig,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    // GET /
    let root = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::root_handler);

    // GET /health
    let health = warp::path!("health")
        .and(warp::get())
        .and_then(handlers::health_handler);

    // POST /api/chat?stream=&include_history=
    let chat = warp::path!("api" / "chat")
        .and(warp::post())
        .and(warp::query::<ChatQuery>())
        .and(warp::body::content_length_limit(MAX_JSON_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_handler);

    // GET /api/chat/sessions?user_id=
    let list_sessions = warp::path!("api" / "chat" / "sessions")
        .and(warp::get())
        .and(warp::query::<UserQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::list_sessions_handler);

    // GET /api/chat/{chat_id}/history
    let session_history = warp::path!("api" / "chat" / String / "history")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::session_history_handler);

    // DELETE /api/chat/{chat_id}
    let delete_session = warp::path!("api" / "chat" / String)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(handlers::delete_session_handler);

    // POST /api/ai/analyze-glucose
    let analyze_glucose = warp::path!("api" / "ai" / "analyze-glucose")
        .and(warp::post())
        .and(warp::multipart::form().max_length(config.max_upload_bytes))
        .and(with_state(state.clone()))
        .and_then(handlers::analyze_glucose_handler);

    // POST /api/ai/analyze-food?health_context=
    let analyze_food = warp::path!("api" / "ai" / "analyze-food")
        .and(warp::post())
        .and(warp::query::<ImageQuery>())
        .and(warp::multipart::form().max_length(config.max_upload_bytes))
        .and(with_state(state.clone()))
        .and_then(handlers::analyze_food_handler);

    // POST /api/ai/analyze-image?health_context=&chat_id=&user_id=
    let analyze_image = warp::path!("api" / "ai" / "analyze-image")
        .and(warp::post())
        .and(warp::query::<ImageQuery>())
        .and(warp::multipart::form().max_length(config.max_upload_bytes))
        .and(with_state(state.clone()))
        .and_then(handlers::analyze_image_handler);

    // GET /api/analytics/glucose/weekly?user_id=&days=
    let weekly_glucose = warp::path!("api" / "analytics" / "glucose" / "weekly")
        .and(warp::get())
        .and(warp::query::<AnalyticsQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::weekly_glucose_handler);

    // GET /api/analytics/glucose/summary?user_id=&days=
    let glucose_summary = warp::path!("api" / "analytics" / "glucose" / "summary")
        .and(warp::get())
        .and(warp::query::<AnalyticsQuery>())
        .and(with_state(state))
        .and_then(handlers::glucose_summary_handler);

    // GET /media/...
    let media = warp::path("media").and(warp::fs::dir(config.media_root));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization", "accept"]);

    // Combine routes
    root.or(health)
        .or(chat)
        .or(list_sessions)
        .or(session_history)
        .or(delete_session)
        .or(analyze_glucose)
        .or(analyze_food)
        .or(analyze_image)
        .or(weekly_glucose)
        .or(glucose_summary)
        .or(media)
        .with(cors)
        .recover(handle_rejection)
        .with(warp::trace::request())
}
