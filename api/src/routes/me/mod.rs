use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod enrollments;
pub mod exceptions;
pub mod grades;
pub mod offerings;

/// Student-facing surface. Everything here acts on behalf of the
/// authenticated student's own profile.
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/offerings", get(offerings::list_catalog))
        .route("/eligibility/{offering_id}", get(offerings::check_eligibility))
        .route("/enrollments", get(enrollments::list_enrollments))
        .route(
            "/enrollments/{id}",
            post(enrollments::enroll).delete(enrollments::unenroll),
        )
        .route("/finalize", post(enrollments::finalize))
        .route("/grades", get(grades::list_my_grades))
        .route("/exceptions", get(exceptions::list_my_exceptions))
        .route("/exceptions", post(exceptions::create_exception))
}
