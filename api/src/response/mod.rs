use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use db::DomainError;

/// Standardized response wrapper for all outgoing JSON.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error responses carry `T::default()` as data, which for most
    /// endpoints is an empty object or `null`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// Maps a `DomainError` onto the envelope. Multi-reason failures keep their
/// detail in `data` so clients can render each reason, not just the joined
/// message.
pub fn domain_error(err: DomainError) -> Response {
    let message = err.to_string();
    let (status, data) = match err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, serde_json::Value::Null),
        DomainError::NotEligible(reasons) => {
            (StatusCode::BAD_REQUEST, json!({ "reasons": reasons }))
        }
        DomainError::IncompleteGrades(missing) => {
            (StatusCode::UNPROCESSABLE_ENTITY, json!({ "missing": missing }))
        }
        DomainError::InvalidTransition { .. }
        | DomainError::Conflict
        | DomainError::AlreadyEnrolled { .. } => (StatusCode::CONFLICT, serde_json::Value::Null),
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, serde_json::Value::Null),
        DomainError::Forbidden => (StatusCode::FORBIDDEN, serde_json::Value::Null),
        DomainError::Db(ref e) => {
            tracing::error!(error = %e, "database error while handling request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::Value::Null,
            )
        }
    };

    (
        status,
        Json(ApiResponse {
            success: false,
            data,
            message,
        }),
    )
        .into_response()
}
