use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use crate::routes::common::{format_validation_errors, require_student};
use db::DomainError;
use db::models::{exception_request, offering};

/// GET /api/v1/me/exceptions
///
/// The student's own exception requests, newest first.
pub async fn list_my_exceptions(
    State(app_state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;
        Ok::<_, DomainError>(
            exception_request::Entity::find()
                .filter(exception_request::Column::StudentId.eq(student.id))
                .order_by_desc(exception_request::Column::Id)
                .all(db)
                .await?,
        )
    }
    .await;

    match result {
        Ok(items) => Json(ApiResponse::success(
            items,
            "Exception requests retrieved successfully",
        ))
        .into_response(),
        Err(e) => domain_error(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExceptionRequest {
    pub kind: exception_request::Kind,
    /// Required for every kind except `extra_subject`.
    pub offering_id: Option<i64>,
    #[validate(length(min = 10, max = 1000, message = "Reason must be 10 to 1000 characters"))]
    pub reason: String,
}

/// POST /api/v1/me/exceptions
///
/// Files a request for administrator review. A pending request of the same
/// kind for the same offering cannot be duplicated.
pub async fn create_exception(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateExceptionRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(format_validation_errors(
                &validation_errors,
            ))),
        )
            .into_response();
    }

    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;

        if req.kind != exception_request::Kind::ExtraSubject && req.offering_id.is_none() {
            return Err(DomainError::Validation(format!(
                "An offering is required for {} requests",
                req.kind
            )));
        }
        if let Some(offering_id) = req.offering_id {
            offering::Entity::find_by_id(offering_id)
                .one(db)
                .await?
                .ok_or(DomainError::NotFound("Offering"))?;
        }

        let mut dup = exception_request::Entity::find()
            .filter(exception_request::Column::StudentId.eq(student.id))
            .filter(exception_request::Column::Kind.eq(req.kind))
            .filter(exception_request::Column::Status.eq(exception_request::Status::Pending));
        dup = match req.offering_id {
            Some(offering_id) => dup.filter(exception_request::Column::OfferingId.eq(offering_id)),
            None => dup.filter(exception_request::Column::OfferingId.is_null()),
        };
        let pending = dup.one(db).await?;
        if pending.is_some() {
            return Err(DomainError::Conflict);
        }

        let now = Utc::now();
        Ok(exception_request::ActiveModel {
            student_id: Set(student.id),
            kind: Set(req.kind),
            offering_id: Set(req.offering_id),
            reason: Set(req.reason.trim().to_owned()),
            status: Set(exception_request::Status::Pending),
            reviewed_by: Set(None),
            admin_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }
    .await;

    match result {
        Ok(created) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(created, "Exception request filed")),
        )
            .into_response(),
        Err(DomainError::Conflict) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<()>::error(
                "A pending exception request of this kind already exists",
            )),
        )
            .into_response(),
        Err(e) => domain_error(e),
    }
}
