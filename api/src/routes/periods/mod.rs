use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

pub fn periods_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_periods))
        .route("/", post(post::create_period))
        .route("/{period_id}/open", post(post::open_period))
        .route("/{period_id}/close", post(post::close_period))
}
