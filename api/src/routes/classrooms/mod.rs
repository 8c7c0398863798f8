use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

pub fn classrooms_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_classrooms))
        .route("/", post(post::create_classroom))
}
