use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

/// Administrator review queue for grade submissions.
pub fn grades_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions", get(get::list_submissions))
        .route("/submissions/{submission_id}", get(get::get_submission))
        .route("/submissions/{submission_id}/approve", post(post::approve))
        .route("/submissions/{submission_id}/reject", post(post::reject))
        .route("/submissions/{submission_id}/publish", post(post::publish))
}
