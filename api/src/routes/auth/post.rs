use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::routes::common::format_validation_errors;
use db::models::{student, user};

lazy_static::lazy_static! {
    static ref STUDENT_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^EST-\d{4}-\d{4}$").unwrap();
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3 to 32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Defaults to `student`.
    pub role: Option<user::Role>,

    /// Required for student accounts, e.g. "EST-2026-0153".
    #[validate(regex(
        path = "*STUDENT_CODE_REGEX",
        message = "Student code must be in format EST-YYYY-NNNN"
    ))]
    pub student_code: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct AuthUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Option<user::Role>,
    pub token: String,
    pub expires_at: String,
}

/// POST /api/v1/auth/register
///
/// Creates an account and returns a fresh token. Student accounts also get
/// a student profile keyed by their institutional code.
///
/// - `201 Created` with the user and token
/// - `400 Bad Request` on validation failure
/// - `409 Conflict` when the username, email or student code is taken
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthUserResponse>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    let db = app_state.db();
    let role = req.role.unwrap_or(user::Role::Student);

    let student_code = match (role, req.student_code.as_deref()) {
        (user::Role::Student, Some(code)) => Some(code.to_owned()),
        (user::Role::Student, None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("Student accounts require a student code")),
            );
        }
        (_, _) => None,
    };

    match user::Model::find_by_username(db, &req.username).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("A user with this username already exists")),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    let created = match user::Model::create(db, &req.username, &req.email, &req.password, role).await
    {
        Ok(u) => u,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    if let Some(code) = student_code {
        if let Err(e) = student::Model::create(db, created.id, &code, 7).await {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(format!(
                    "Failed to create student profile: {e}"
                ))),
            );
        }
    }

    let (token, expires_at) = generate_jwt(created.id, created.role);
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AuthUserResponse {
                id: created.id,
                username: created.username,
                email: created.email,
                role: Some(created.role),
                token,
                expires_at,
            },
            "User registered successfully",
        )),
    )
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/v1/auth/login
///
/// - `200 OK` with a fresh token
/// - `401 Unauthorized` on bad credentials
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthUserResponse>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    match user::Model::verify_credentials(app_state.db(), &req.username, &req.password).await {
        Ok(Some(user)) => {
            let (token, expires_at) = generate_jwt(user.id, user.role);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    AuthUserResponse {
                        id: user.id,
                        username: user.username,
                        email: user.email,
                        role: Some(user.role),
                        token,
                        expires_at,
                    },
                    "Login successful",
                )),
            )
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid username or password")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
