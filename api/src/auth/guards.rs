//! Role-based access guards, applied per route group with
//! `axum::middleware::from_fn`. Each guard authenticates the caller, stores
//! the `AuthUser` in request extensions for handlers, and enforces the role
//! the group requires.

use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user::Role;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(serde::Serialize, Default)]
pub struct Empty;

async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn forbidden(message: &str) -> (StatusCode, Json<ApiResponse<Empty>>) {
    (StatusCode::FORBIDDEN, Json(ApiResponse::error(message)))
}

/// Admin-only guard.
pub async fn allow_admin(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if user.0.role != Role::Administrator {
        return Err(forbidden("Administrator access required"));
    }
    Ok(next.run(req).await)
}

/// Teachers manage grade sheets; administrators may also pass through so
/// they can inspect any offering.
pub async fn allow_teacher(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if !matches!(user.0.role, Role::Teacher | Role::Administrator) {
        return Err(forbidden("Teacher access required"));
    }
    Ok(next.run(req).await)
}

/// Student-only guard for the `/me` surface.
pub async fn allow_student(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if user.0.role != Role::Student {
        return Err(forbidden("Student access required"));
    }
    Ok(next.run(req).await)
}
