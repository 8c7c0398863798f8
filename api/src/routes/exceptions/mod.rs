use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

/// Administrator review queue for exception requests.
pub fn exceptions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_exceptions))
        .route("/{exception_id}/approve", post(post::approve_exception))
        .route("/{exception_id}/reject", post(post::reject_exception))
}
