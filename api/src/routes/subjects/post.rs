use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResponse, domain_error};
use crate::routes::common::format_validation_errors;
use crate::routes::subjects::get::SubjectItem;
use db::models::{subject, subject_prerequisite};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 16, message = "Subject code must be 1 to 16 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 128, message = "Subject name must be 1 to 128 characters"))]
    pub name: String,
    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: i32,
    #[serde(default)]
    pub prerequisite_ids: Vec<i64>,
}

/// POST /api/v1/subjects
///
/// Creates a subject together with its prerequisite links.
///
/// - `201 Created` with the subject
/// - `400 Bad Request` on validation failure or unknown prerequisite ids
/// - `409 Conflict` when the code is taken
pub async fn create_subject(
    State(app_state): State<AppState>,
    Json(req): Json<CreateSubjectRequest>,
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

    match subject::Entity::find()
        .filter(subject::Column::Code.eq(req.code.clone()))
        .one(db)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::<()>::error(
                    "A subject with this code already exists",
                )),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => return domain_error(e.into()),
    }

    if !req.prerequisite_ids.is_empty() {
        let found = match subject::Entity::find()
            .filter(subject::Column::Id.is_in(req.prerequisite_ids.clone()))
            .all(db)
            .await
        {
            Ok(f) => f,
            Err(e) => return domain_error(e.into()),
        };
        if found.len() != req.prerequisite_ids.len() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error("Unknown prerequisite subject id")),
            )
                .into_response();
        }
    }

    let result = async {
        let txn = db.begin().await?;
        let now = Utc::now();
        let created = subject::ActiveModel {
            code: Set(req.code.clone()),
            name: Set(req.name.clone()),
            semester: Set(req.semester),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for prerequisite_id in &req.prerequisite_ids {
            subject_prerequisite::ActiveModel {
                subject_id: Set(created.id),
                prerequisite_id: Set(*prerequisite_id),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;
        Ok::<_, sea_orm::DbErr>(created)
    }
    .await;

    match result {
        Ok(created) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SubjectItem {
                    subject: created,
                    prerequisite_ids: req.prerequisite_ids,
                },
                "Subject created successfully",
            )),
        )
            .into_response(),
        Err(e) => domain_error(e.into()),
    }
}
