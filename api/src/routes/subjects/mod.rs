use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

pub fn subjects_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_subjects))
        .route("/", post(post::create_subject))
}
