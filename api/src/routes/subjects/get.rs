use axum::{Json, extract::State, response::IntoResponse};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use util::state::AppState;

use crate::response::{ApiResponse, domain_error};
use db::models::{subject, subject_prerequisite};

#[derive(Debug, Serialize)]
pub struct SubjectItem {
    #[serde(flatten)]
    pub subject: subject::Model,
    pub prerequisite_ids: Vec<i64>,
}

/// GET /api/v1/subjects
///
/// All subjects with their prerequisite subject ids, ordered by code.
pub async fn list_subjects(State(app_state): State<AppState>) -> impl IntoResponse {
    let db = app_state.db();

    let subjects = match subject::Entity::find()
        .order_by_asc(subject::Column::Code)
        .all(db)
        .await
    {
        Ok(s) => s,
        Err(e) => return domain_error(e.into()),
    };

    let links = match subject_prerequisite::Entity::find().all(db).await {
        Ok(l) => l,
        Err(e) => return domain_error(e.into()),
    };
    let mut by_subject: HashMap<i64, Vec<i64>> = HashMap::new();
    for link in links {
        by_subject
            .entry(link.subject_id)
            .or_default()
            .push(link.prerequisite_id);
    }

    let items: Vec<SubjectItem> = subjects
        .into_iter()
        .map(|s| {
            let prerequisite_ids = by_subject.remove(&s.id).unwrap_or_default();
            SubjectItem {
                subject: s,
                prerequisite_ids,
            }
        })
        .collect();

    Json(ApiResponse::success(items, "Subjects retrieved successfully")).into_response()
}
