use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResponse, domain_error};
use crate::routes::common::format_validation_errors;
use db::models::classroom;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassroomRequest {
    #[validate(length(min = 1, max = 16, message = "Classroom code must be 1 to 16 characters"))]
    pub code: String,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
}

/// POST /api/v1/classrooms
pub async fn create_classroom(
    State(app_state): State<AppState>,
    Json(req): Json<CreateClassroomRequest>,
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
    match classroom::Entity::find()
        .filter(classroom::Column::Code.eq(req.code.clone()))
        .one(db)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::<()>::error(
                    "A classroom with this code already exists",
                )),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => return domain_error(e.into()),
    }

    let created = classroom::ActiveModel {
        code: Set(req.code),
        capacity: Set(req.capacity),
        ..Default::default()
    }
    .insert(db)
    .await;

    match created {
        Ok(room) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(room, "Classroom created successfully")),
        )
            .into_response(),
        Err(e) => domain_error(e.into()),
    }
}
