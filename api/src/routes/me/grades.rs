use axum::{Json, extract::State, response::IntoResponse};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use crate::routes::common::require_student;
use db::DomainError;
use db::models::{
    enrollment, grade_component, grade_submission, offering, student_grade, subject,
};

#[derive(Debug, Serialize)]
pub struct ComponentScore {
    pub name: String,
    pub max_score: f64,
    pub weight_percent: i32,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct PublishedGradeItem {
    pub enrollment_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub final_grade: Option<f64>,
    pub status: enrollment::Status,
    pub components: Vec<ComponentScore>,
}

/// GET /api/v1/me/grades
///
/// Grades for offerings whose submission has been published. Draft and
/// in-review sheets stay invisible to students.
pub async fn list_my_grades(
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

        let offering_ids: Vec<i64> = rows
            .iter()
            .filter_map(|(_, off)| off.as_ref().map(|o| o.id))
            .collect();
        if offering_ids.is_empty() {
            return Ok(Vec::new());
        }

        let published: std::collections::HashSet<i64> = grade_submission::Entity::find()
            .filter(grade_submission::Column::OfferingId.is_in(offering_ids.clone()))
            .filter(grade_submission::Column::Status.eq(grade_submission::Status::Published))
            .all(db)
            .await?
            .into_iter()
            .map(|s| s.offering_id)
            .collect();

        let components: HashMap<i64, grade_component::Model> = grade_component::Entity::find()
            .filter(grade_component::Column::OfferingId.is_in(offering_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let subject_ids: Vec<i64> = rows
            .iter()
            .filter_map(|(_, off)| off.as_ref().map(|o| o.subject_id))
            .collect();
        let subjects: HashMap<i64, subject::Model> = subject::Entity::find()
            .filter(subject::Column::Id.is_in(subject_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut items = Vec::new();
        for (enr, off) in rows {
            let Some(off) = off else { continue };
            if !published.contains(&off.id) {
                continue;
            }

            let scores = student_grade::Entity::find()
                .filter(student_grade::Column::EnrollmentId.eq(enr.id))
                .all(db)
                .await?;
            let mut ordered: Vec<(i32, ComponentScore)> = scores
                .into_iter()
                .filter_map(|row| {
                    components.get(&row.component_id).map(|c| {
                        (
                            c.ordinal,
                            ComponentScore {
                                name: c.name.clone(),
                                max_score: c.max_score,
                                weight_percent: c.weight_percent,
                                score: row.score,
                            },
                        )
                    })
                })
                .collect();
            ordered.sort_by_key(|(ordinal, _)| *ordinal);
            let component_scores: Vec<ComponentScore> =
                ordered.into_iter().map(|(_, cs)| cs).collect();

            let subject = subjects.get(&off.subject_id);
            items.push(PublishedGradeItem {
                enrollment_id: enr.id,
                subject_code: subject.map(|s| s.code.clone()).unwrap_or_default(),
                subject_name: subject.map(|s| s.name.clone()).unwrap_or_default(),
                final_grade: enr.final_grade,
                status: enr.status,
                components: component_scores,
            });
        }
        Ok::<_, DomainError>(items)
    }
    .await;

    match result {
        Ok(items) => {
            Json(ApiResponse::success(items, "Grades retrieved successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}
