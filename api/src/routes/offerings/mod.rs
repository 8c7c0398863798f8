use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_teacher};

pub mod get;
pub mod grades;
pub mod post;

/// Offering administration is admin-only; listings and the per-offering
/// grade sheet belong to teachers (handlers re-check that the caller is the
/// assigned teacher).
pub fn offerings_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(post::create_offering))
        .route_layer(from_fn(allow_admin));

    let teacher = Router::new()
        .route("/", get(get::list_offerings))
        .route("/{offering_id}/grades", get(grades::get_grade_sheet))
        .route("/{offering_id}/grades", post(grades::save_scores))
        .route("/{offering_id}/grades/structure", put(grades::put_structure))
        .route("/{offering_id}/grades/submit", post(grades::submit_grades))
        .route_layer(from_fn(allow_teacher));

    admin.merge(teacher)
}
