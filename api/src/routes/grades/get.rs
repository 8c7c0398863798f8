use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use util::state::AppState;

use crate::response::{ApiResponse, domain_error};
use db::models::{grade_submission, offering, subject, user, workflow_log};
use db::{DomainError, workflow};

#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    pub status: Option<grade_submission::Status>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionItem {
    #[serde(flatten)]
    pub submission: grade_submission::Model,
    pub subject_code: String,
    pub subject_name: String,
    pub teacher_username: String,
}

/// GET /api/v1/grades/submissions?status=
///
/// Review queue, newest activity first. Without a filter every submission
/// is returned.
pub async fn list_submissions(
    State(app_state): State<AppState>,
    Query(query): Query<ListSubmissionsQuery>,
) -> impl IntoResponse {
    let db = app_state.db();

    let mut finder = grade_submission::Entity::find()
        .order_by_desc(grade_submission::Column::UpdatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(grade_submission::Column::Status.eq(status));
    }

    let result = async {
        let submissions = finder.all(db).await?;

        let offering_ids: Vec<i64> = submissions.iter().map(|s| s.offering_id).collect();
        let offerings: HashMap<i64, offering::Model> = if offering_ids.is_empty() {
            HashMap::new()
        } else {
            offering::Entity::find()
                .filter(offering::Column::Id.is_in(offering_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|o| (o.id, o))
                .collect()
        };

        let subject_ids: Vec<i64> = offerings.values().map(|o| o.subject_id).collect();
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

        let teacher_ids: Vec<i64> = offerings.values().map(|o| o.teacher_id).collect();
        let teachers: HashMap<i64, String> = if teacher_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(teacher_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };

        let items: Vec<SubmissionItem> = submissions
            .into_iter()
            .map(|sub| {
                let off = offerings.get(&sub.offering_id);
                let subject = off.and_then(|o| subjects.get(&o.subject_id));
                SubmissionItem {
                    subject_code: subject.map(|s| s.code.clone()).unwrap_or_default(),
                    subject_name: subject.map(|s| s.name.clone()).unwrap_or_default(),
                    teacher_username: off
                        .and_then(|o| teachers.get(&o.teacher_id).cloned())
                        .unwrap_or_default(),
                    submission: sub,
                }
            })
            .collect();
        Ok::<_, DomainError>(items)
    }
    .await;

    match result {
        Ok(items) => Json(ApiResponse::success(
            items,
            "Grade submissions retrieved successfully",
        ))
        .into_response(),
        Err(e) => domain_error(e),
    }
}

#[derive(Debug, Serialize)]
pub struct AuditEntry {
    #[serde(flatten)]
    pub log: workflow_log::Model,
    pub actor_username: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: grade_submission::Model,
    pub history: Vec<AuditEntry>,
}

/// GET /api/v1/grades/submissions/{submission_id}
///
/// Submission with its full audit trail, oldest action first.
pub async fn get_submission(
    State(app_state): State<AppState>,
    Path(submission_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let submission = grade_submission::Entity::find_by_id(submission_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Grade submission"))?;

        let logs = workflow::history(db, submission_id).await?;
        let actor_ids: Vec<i64> = logs.iter().map(|l| l.actor_id).collect();
        let actors: HashMap<i64, String> = if actor_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(actor_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };

        let history = logs
            .into_iter()
            .map(|log| AuditEntry {
                actor_username: actors.get(&log.actor_id).cloned().unwrap_or_default(),
                log,
            })
            .collect();

        Ok::<_, DomainError>(SubmissionDetail { submission, history })
    }
    .await;

    match result {
        Ok(detail) => Json(ApiResponse::success(
            detail,
            "Grade submission retrieved successfully",
        ))
        .into_response(),
        Err(e) => domain_error(e),
    }
}
