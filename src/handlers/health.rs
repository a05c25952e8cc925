// GET / and GET /health

use std::convert::Infallible;
use warp::reply::Response;
use warp::Reply;

use crate::models::{HealthResponse, WelcomeResponse};
use crate::state::AppState;

pub async fn root_handler(state: AppState) -> Result<Response, Infallible> {
    Ok(warp::reply::json(&WelcomeResponse {
        message: format!("Welcome to {}", state.app_name),
        version: state.app_version.to_string(),
    })
    .into_response())
}

pub async fn health_handler() -> Result<Response, Infallible> {
    Ok(warp::reply::json(&HealthResponse { status: "healthy" }).into_response())
}
