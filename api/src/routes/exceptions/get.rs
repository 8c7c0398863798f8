use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use util::state::AppState;

use crate::response::{ApiResponse, domain_error};
use db::DomainError;
use db::models::{exception_request, student};

#[derive(Debug, Deserialize)]
pub struct ListExceptionsQuery {
    pub status: Option<exception_request::Status>,
}

#[derive(Debug, Serialize)]
pub struct ExceptionItem {
    #[serde(flatten)]
    pub request: exception_request::Model,
    pub student_code: String,
}

/// GET /api/v1/exceptions?status=
///
/// Exception requests with the requesting student's code, oldest pending
/// work first.
pub async fn list_exceptions(
    State(app_state): State<AppState>,
    Query(query): Query<ListExceptionsQuery>,
) -> impl IntoResponse {
    let db = app_state.db();

    let mut finder =
        exception_request::Entity::find().order_by_asc(exception_request::Column::Id);
    if let Some(status) = query.status {
        finder = finder.filter(exception_request::Column::Status.eq(status));
    }

    let result = async {
        let requests = finder.all(db).await?;

        let student_ids: Vec<i64> = requests.iter().map(|r| r.student_id).collect();
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

        let items: Vec<ExceptionItem> = requests
            .into_iter()
            .map(|request| ExceptionItem {
                student_code: codes.get(&request.student_id).cloned().unwrap_or_default(),
                request,
            })
            .collect();
        Ok::<_, DomainError>(items)
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
