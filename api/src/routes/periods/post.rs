use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResponse, domain_error};
use crate::routes::common::format_validation_errors;
use db::DomainError;
use db::models::enrollment_period::{self, Status};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePeriodRequest {
    #[validate(length(min = 1, max = 64, message = "Period name must be 1 to 64 characters"))]
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// POST /api/v1/periods
///
/// Creates a period in `draft`; it takes enrollments only after being opened.
pub async fn create_period(
    State(app_state): State<AppState>,
    Json(req): Json<CreatePeriodRequest>,
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
    if req.end_date <= req.start_date {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("End date must be after start date")),
        )
            .into_response();
    }

    let created = enrollment_period::ActiveModel {
        name: Set(req.name),
        start_date: Set(req.start_date),
        end_date: Set(req.end_date),
        status: Set(Status::Draft),
        ..Default::default()
    }
    .insert(app_state.db())
    .await;

    match created {
        Ok(period) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                period,
                "Enrollment period created successfully",
            )),
        )
            .into_response(),
        Err(e) => domain_error(e.into()),
    }
}

/// POST /api/v1/periods/{period_id}/open
///
/// Opens a period for enrollment. Only one period may be open at a time,
/// so a second open attempt returns `409 Conflict`.
pub async fn open_period(
    State(app_state): State<AppState>,
    Path(period_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let already_open = match enrollment_period::Entity::find()
        .filter(enrollment_period::Column::Status.eq(Status::Open))
        .one(db)
        .await
    {
        Ok(found) => found,
        Err(e) => return domain_error(e.into()),
    };
    if let Some(open) = already_open {
        if open.id != period_id {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::<()>::error(format!(
                    "Enrollment period '{}' is already open",
                    open.name
                ))),
            )
                .into_response();
        }
    }

    set_status(db, period_id, Status::Open, "Enrollment period opened").await
}

/// POST /api/v1/periods/{period_id}/close
pub async fn close_period(
    State(app_state): State<AppState>,
    Path(period_id): Path<i64>,
) -> impl IntoResponse {
    set_status(app_state.db(), period_id, Status::Closed, "Enrollment period closed").await
}

async fn set_status(
    db: &sea_orm::DatabaseConnection,
    period_id: i64,
    status: Status,
    message: &str,
) -> axum::response::Response {
    let period = match enrollment_period::Entity::find_by_id(period_id).one(db).await {
        Ok(Some(p)) => p,
        Ok(None) => return domain_error(DomainError::NotFound("Enrollment period")),
        Err(e) => return domain_error(e.into()),
    };

    let mut active: enrollment_period::ActiveModel = period.into();
    active.status = Set(status);
    match active.update(db).await {
        Ok(updated) => Json(ApiResponse::success(updated, message)).into_response(),
        Err(e) => domain_error(e.into()),
    }
}
