use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use crate::routes::common::require_user;
use db::workflow;

#[derive(Debug, Deserialize, Default)]
pub struct ReviewRequest {
    pub notes: Option<String>,
}

/// POST /api/v1/grades/submissions/{submission_id}/approve
pub async fn approve(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let db = app_state.db();
    let notes = body.and_then(|Json(b)| b.notes);

    let result = async {
        let actor = require_user(db, auth.0.sub).await?;
        workflow::approve(db, submission_id, &actor, notes).await
    }
    .await;

    match result {
        Ok(submission) => {
            Json(ApiResponse::success(submission, "Grade submission approved")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

/// POST /api/v1/grades/submissions/{submission_id}/reject
///
/// The body must carry notes explaining what to fix.
pub async fn reject(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let db = app_state.db();
    let notes = body.and_then(|Json(b)| b.notes).unwrap_or_default();

    let result = async {
        let actor = require_user(db, auth.0.sub).await?;
        workflow::reject(db, submission_id, &actor, &notes).await
    }
    .await;

    match result {
        Ok(submission) => {
            Json(ApiResponse::success(submission, "Grade submission rejected")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

/// POST /api/v1/grades/submissions/{submission_id}/publish
pub async fn publish(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let actor = require_user(db, auth.0.sub).await?;
        workflow::publish(db, submission_id, &actor).await
    }
    .await;

    match result {
        Ok(submission) => {
            Json(ApiResponse::success(submission, "Grades published")).into_response()
        }
        Err(e) => domain_error(e),
    }
}
