use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;
use util::state::AppState;

use crate::response::ApiResponse;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// GET /api/v1/health
async fn health() -> impl IntoResponse {
    Json(ApiResponse::success(
        json!({ "status": "ok" }),
        "Service is healthy",
    ))
}
