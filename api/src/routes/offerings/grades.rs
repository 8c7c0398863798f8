//! The per-offering grade sheet, managed by the assigned teacher.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use crate::routes::common::require_offering_access;
use db::models::{
    enrollment, grade_component, grade_submission, student, student_grade, workflow_log,
};
use db::{DomainError, workflow};

#[derive(Debug, Serialize)]
pub struct ScoreItem {
    pub component_id: i64,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct RosterRow {
    pub enrollment_id: i64,
    pub student_code: String,
    pub scores: Vec<ScoreItem>,
}

#[derive(Debug, Serialize, Default)]
pub struct GradeSheetResponse {
    pub offering_id: i64,
    pub submission: Option<grade_submission::Model>,
    /// Notes from the most recent rejection, if the sheet was sent back.
    pub rejection_notes: Option<String>,
    pub components: Vec<grade_component::Model>,
    pub roster: Vec<RosterRow>,
}

/// GET /api/v1/offerings/{offering_id}/grades
///
/// Structure, roster with entered scores, submission status and the latest
/// rejection notes. Reading never creates the submission record.
pub async fn get_grade_sheet(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(offering_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();
    if let Err(e) = require_offering_access(db, &auth, offering_id).await {
        return domain_error(e);
    }

    let result = async {
        let submission = grade_submission::Entity::find()
            .filter(grade_submission::Column::OfferingId.eq(offering_id))
            .one(db)
            .await?;

        let rejection_notes = match &submission {
            Some(sub) => workflow_log::Entity::find()
                .filter(workflow_log::Column::SubmissionId.eq(sub.id))
                .filter(workflow_log::Column::Action.eq(workflow_log::Action::Reject))
                .order_by_desc(workflow_log::Column::Id)
                .one(db)
                .await?
                .and_then(|log| log.notes),
            None => None,
        };

        let components = grade_component::Entity::find()
            .filter(grade_component::Column::OfferingId.eq(offering_id))
            .order_by_asc(grade_component::Column::Ordinal)
            .all(db)
            .await?;

        let enrollments = enrollment::Entity::find()
            .filter(enrollment::Column::OfferingId.eq(offering_id))
            .filter(enrollment::Column::Status.eq(enrollment::Status::Active))
            .all(db)
            .await?;

        let student_ids: Vec<i64> = enrollments.iter().map(|e| e.student_id).collect();
        let codes: HashMap<i64, String> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            student::Entity::find()
                .filter(student::Column::Id.is_in(student_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|s| (s.id, s.code))
                .collect()
        };

        let enrollment_ids: Vec<i64> = enrollments.iter().map(|e| e.id).collect();
        let mut scores: HashMap<i64, Vec<ScoreItem>> = HashMap::new();
        if !enrollment_ids.is_empty() {
            for row in student_grade::Entity::find()
                .filter(student_grade::Column::EnrollmentId.is_in(enrollment_ids))
                .all(db)
                .await?
            {
                scores.entry(row.enrollment_id).or_default().push(ScoreItem {
                    component_id: row.component_id,
                    score: row.score,
                });
            }
        }

        let mut roster: Vec<RosterRow> = enrollments
            .into_iter()
            .map(|enr| RosterRow {
                student_code: codes.get(&enr.student_id).cloned().unwrap_or_default(),
                scores: scores.remove(&enr.id).unwrap_or_default(),
                enrollment_id: enr.id,
            })
            .collect();
        roster.sort_by(|a, b| a.student_code.cmp(&b.student_code));

        Ok::<_, DomainError>(GradeSheetResponse {
            offering_id,
            submission,
            rejection_notes,
            components,
            roster,
        })
    }
    .await;

    match result {
        Ok(sheet) => {
            Json(ApiResponse::success(sheet, "Grade sheet retrieved successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ComponentRequest {
    pub name: String,
    pub max_score: f64,
    pub weight_percent: i32,
}

#[derive(Debug, Deserialize)]
pub struct StructureRequest {
    pub components: Vec<ComponentRequest>,
}

/// PUT /api/v1/offerings/{offering_id}/grades/structure
///
/// Replaces the grade structure. Allowed only while the submission is
/// editable; previously entered scores are discarded with the old
/// components.
pub async fn put_structure(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(offering_id): Path<i64>,
    Json(req): Json<StructureRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        require_offering_access(db, &auth, offering_id).await?;
        let submission = workflow::get_or_create(db, offering_id, auth.0.sub).await?;
        if !submission.status.is_editable() {
            return Err(DomainError::Validation(format!(
                "Grade structure cannot be changed while the submission is {}",
                submission.status
            )));
        }

        let proposed: Vec<grade_component::Model> = req
            .components
            .iter()
            .enumerate()
            .map(|(idx, c)| grade_component::Model {
                id: 0,
                offering_id,
                name: c.name.trim().to_owned(),
                max_score: c.max_score,
                weight_percent: c.weight_percent,
                ordinal: idx as i32 + 1,
            })
            .collect();
        db::grading::validate_structure(&proposed)?;

        let txn = db.begin().await?;
        let old_ids: Vec<i64> = grade_component::Entity::find()
            .filter(grade_component::Column::OfferingId.eq(offering_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if !old_ids.is_empty() {
            student_grade::Entity::delete_many()
                .filter(student_grade::Column::ComponentId.is_in(old_ids.clone()))
                .exec(&txn)
                .await?;
            grade_component::Entity::delete_many()
                .filter(grade_component::Column::Id.is_in(old_ids))
                .exec(&txn)
                .await?;
        }

        let mut saved = Vec::with_capacity(proposed.len());
        for component in proposed {
            saved.push(
                grade_component::ActiveModel {
                    offering_id: Set(component.offering_id),
                    name: Set(component.name),
                    max_score: Set(component.max_score),
                    weight_percent: Set(component.weight_percent),
                    ordinal: Set(component.ordinal),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            );
        }
        txn.commit().await?;
        Ok::<_, DomainError>(saved)
    }
    .await;

    match result {
        Ok(components) => {
            Json(ApiResponse::success(components, "Grade structure saved successfully"))
                .into_response()
        }
        Err(e) => domain_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreEntry {
    pub enrollment_id: i64,
    pub component_id: i64,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SaveScoresRequest {
    pub scores: Vec<ScoreEntry>,
}

/// POST /api/v1/offerings/{offering_id}/grades
///
/// Saves draft scores. Each entry must reference a component of this
/// offering and an active enrollment in it, with the score inside
/// `0..=max_score`.
pub async fn save_scores(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(offering_id): Path<i64>,
    Json(req): Json<SaveScoresRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        require_offering_access(db, &auth, offering_id).await?;
        let submission = workflow::get_or_create(db, offering_id, auth.0.sub).await?;
        if !submission.status.is_editable() {
            return Err(DomainError::Validation(format!(
                "Scores cannot be changed while the submission is {}",
                submission.status
            )));
        }

        let components: HashMap<i64, grade_component::Model> = grade_component::Entity::find()
            .filter(grade_component::Column::OfferingId.eq(offering_id))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let enrollment_ids: Vec<i64> = enrollment::Entity::find()
            .filter(enrollment::Column::OfferingId.eq(offering_id))
            .filter(enrollment::Column::Status.eq(enrollment::Status::Active))
            .all(db)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        for entry in &req.scores {
            let component = components.get(&entry.component_id).ok_or_else(|| {
                DomainError::Validation("Unknown grade component for this offering".into())
            })?;
            if !enrollment_ids.contains(&entry.enrollment_id) {
                return Err(DomainError::Validation(
                    "Score references an enrollment outside this offering".into(),
                ));
            }
            if entry.score < 0.0 || entry.score > component.max_score {
                return Err(DomainError::Validation(format!(
                    "Score for '{}' must be between 0 and {}",
                    component.name, component.max_score
                )));
            }
        }

        let txn = db.begin().await?;
        let now = Utc::now();
        for entry in &req.scores {
            let existing = student_grade::Entity::find()
                .filter(student_grade::Column::EnrollmentId.eq(entry.enrollment_id))
                .filter(student_grade::Column::ComponentId.eq(entry.component_id))
                .one(&txn)
                .await?;
            match existing {
                Some(row) => {
                    let mut active: student_grade::ActiveModel = row.into();
                    active.score = Set(entry.score);
                    active.updated_at = Set(now);
                    active.update(&txn).await?;
                }
                None => {
                    student_grade::ActiveModel {
                        enrollment_id: Set(entry.enrollment_id),
                        component_id: Set(entry.component_id),
                        score: Set(entry.score),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }
        txn.commit().await?;
        Ok::<_, DomainError>(req.scores.len())
    }
    .await;

    match result {
        Ok(count) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                serde_json::json!({ "saved": count }),
                "Scores saved successfully",
            )),
        )
            .into_response(),
        Err(e) => domain_error(e),
    }
}

/// POST /api/v1/offerings/{offering_id}/grades/submit
///
/// Hands the sheet to review. Fails with `422` listing every missing
/// (student, component) score, or `400` on an invalid structure.
pub async fn submit_grades(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(offering_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        require_offering_access(db, &auth, offering_id).await?;
        workflow::submit(db, offering_id, auth.0.sub).await
    }
    .await;

    match result {
        Ok(submission) => Json(ApiResponse::success(
            submission,
            "Grades submitted for review",
        ))
        .into_response(),
        Err(e) => domain_error(e),
    }
}
