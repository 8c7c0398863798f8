use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{NaiveTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, TransactionTrait};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResponse, domain_error};
use crate::routes::common::format_validation_errors;
use db::DomainError;
use db::models::{
    classroom, enrollment_period, offering, schedule_slot, subject, user,
};

#[derive(Debug, Deserialize)]
pub struct SlotRequest {
    pub day: schedule_slot::Day,
    /// "HH:MM", 24-hour clock.
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOfferingRequest {
    pub subject_id: i64,
    pub teacher_id: i64,
    pub classroom_id: i64,
    pub period_id: i64,
    #[validate(range(min = 1, message = "Quota must be at least 1"))]
    pub max_quota: i32,
    #[serde(default)]
    pub slots: Vec<SlotRequest>,
}

fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message)),
    )
        .into_response()
}

/// POST /api/v1/offerings
///
/// Creates an offering with its weekly schedule slots. All referenced
/// records must exist and `teacher_id` must point at a teacher account.
pub async fn create_offering(
    State(app_state): State<AppState>,
    Json(req): Json<CreateOfferingRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return bad_request(format_validation_errors(&validation_errors));
    }

    let db = app_state.db();

    let references = async {
        let subject = subject::Entity::find_by_id(req.subject_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Subject"))?;
        let teacher = user::Entity::find_by_id(req.teacher_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Teacher"))?;
        classroom::Entity::find_by_id(req.classroom_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Classroom"))?;
        enrollment_period::Entity::find_by_id(req.period_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Enrollment period"))?;
        Ok::<_, DomainError>((subject, teacher))
    }
    .await;

    let teacher = match references {
        Ok((_, teacher)) => teacher,
        Err(e) => return domain_error(e),
    };
    if teacher.role != user::Role::Teacher {
        return bad_request("Assigned user is not a teacher");
    }

    let mut parsed_slots = Vec::with_capacity(req.slots.len());
    for slot in &req.slots {
        let (Ok(start), Ok(end)) = (
            NaiveTime::parse_from_str(&slot.start_time, "%H:%M"),
            NaiveTime::parse_from_str(&slot.end_time, "%H:%M"),
        ) else {
            return bad_request("Slot times must be in HH:MM format");
        };
        if end <= start {
            return bad_request("Slot end time must be after start time");
        }
        parsed_slots.push((slot.day, start, end));
    }

    let result = async {
        let txn = db.begin().await?;
        let now = Utc::now();
        let created = offering::ActiveModel {
            subject_id: Set(req.subject_id),
            teacher_id: Set(req.teacher_id),
            classroom_id: Set(req.classroom_id),
            period_id: Set(req.period_id),
            max_quota: Set(req.max_quota),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (day, start, end) in parsed_slots {
            schedule_slot::ActiveModel {
                offering_id: Set(created.id),
                day: Set(day),
                start_time: Set(start),
                end_time: Set(end),
                ..Default::default()
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
            Json(ApiResponse::success(created, "Offering created successfully")),
        )
            .into_response(),
        Err(e) => domain_error(e.into()),
    }
}
