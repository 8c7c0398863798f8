//! HTTP route entry point for `/api/v1/...`.
//!
//! Route groups and the guard each one sits behind:
//! - `/health` → liveness check (public)
//! - `/auth` → register and login (public)
//! - `/subjects`, `/classrooms`, `/periods` → catalog administration (admin)
//! - `/offerings` → offering administration (admin) and the per-offering
//!   grade sheet surface (assigned teacher or admin)
//! - `/grades` → submission review queue (admin)
//! - `/me` → enrollment, eligibility, grades and exception requests for the
//!   authenticated student
//! - `/exceptions` → exception review queue (admin)

use axum::{Router, middleware::from_fn};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_student};

pub mod auth;
pub mod classrooms;
pub mod common;
pub mod exceptions;
pub mod grades;
pub mod health;
pub mod me;
pub mod offerings;
pub mod periods;
pub mod subjects;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/auth", auth::auth_routes())
        .nest(
            "/subjects",
            subjects::subjects_routes().route_layer(from_fn(allow_admin)),
        )
        .nest(
            "/classrooms",
            classrooms::classrooms_routes().route_layer(from_fn(allow_admin)),
        )
        .nest(
            "/periods",
            periods::periods_routes().route_layer(from_fn(allow_admin)),
        )
        .nest("/offerings", offerings::offerings_routes())
        .nest(
            "/grades",
            grades::grades_routes().route_layer(from_fn(allow_admin)),
        )
        .nest("/me", me::me_routes().route_layer(from_fn(allow_student)))
        .nest(
            "/exceptions",
            exceptions::exceptions_routes().route_layer(from_fn(allow_admin)),
        )
        .with_state(app_state)
}
