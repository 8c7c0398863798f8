use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use crate::routes::common::require_student;
use db::models::{enrollment, offering, subject};
use db::{DomainError, eligibility};

#[derive(Debug, Serialize)]
pub struct EnrollmentItem {
    #[serde(flatten)]
    pub enrollment: enrollment::Model,
    pub subject_code: String,
    pub subject_name: String,
    pub period_id: i64,
}

/// GET /api/v1/me/enrollments
///
/// The student's full enrollment history, newest first.
pub async fn list_enrollments(
    State(app_state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;

        let rows = enrollment::Entity::find()
            .filter(enrollment::Column::StudentId.eq(student.id))
            .find_also_related(offering::Entity)
            .order_by_desc(enrollment::Column::Id)
            .all(db)
            .await?;

        let subject_ids: Vec<i64> = rows
            .iter()
            .filter_map(|(_, off)| off.as_ref().map(|o| o.subject_id))
            .collect();
        let subjects: HashMap<i64, subject::Model> = if subject_ids.is_empty() {
            HashMap::new()
        } else {
            subject::Entity::find()
                .filter(subject::Column::Id.is_in(subject_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        let items: Vec<EnrollmentItem> = rows
            .into_iter()
            .filter_map(|(enr, off)| {
                let off = off?;
                let subject = subjects.get(&off.subject_id);
                Some(EnrollmentItem {
                    subject_code: subject.map(|s| s.code.clone()).unwrap_or_default(),
                    subject_name: subject.map(|s| s.name.clone()).unwrap_or_default(),
                    period_id: off.period_id,
                    enrollment: enr,
                })
            })
            .collect();
        Ok::<_, DomainError>(items)
    }
    .await;

    match result {
        Ok(items) => {
            Json(ApiResponse::success(items, "Enrollments retrieved successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

/// POST /api/v1/me/enrollments/{offering_id}
///
/// Enrolls in an offering. Fails with `400` carrying `data.reasons` when
/// any eligibility rule is violated, or `409` when already enrolled.
pub async fn enroll(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(offering_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;
        eligibility::enroll(db, &student, offering_id, Utc::now()).await
    }
    .await;

    match result {
        Ok(enrolled) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(enrolled, "Enrolled successfully")),
        )
            .into_response(),
        Err(e) => domain_error(e),
    }
}

/// DELETE /api/v1/me/enrollments/{enrollment_id}
///
/// Drops an active enrollment while the period is open and the set is not
/// finalized.
pub async fn unenroll(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(enrollment_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;
        eligibility::unenroll(db, &student, enrollment_id, Utc::now()).await
    }
    .await;

    match result {
        Ok(dropped) => {
            Json(ApiResponse::success(dropped, "Unenrolled successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

/// POST /api/v1/me/finalize
///
/// Irrevocably locks in the enrollment set for the open period.
pub async fn finalize(State(app_state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;
        eligibility::finalize(db, &student, Utc::now()).await
    }
    .await;

    match result {
        Ok(finalization) => {
            Json(ApiResponse::success(finalization, "Enrollment finalized")).into_response()
        }
        Err(e) => domain_error(e),
    }
}
