use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use db::DomainError;
use db::models::exception_request::{self, Status};

#[derive(Debug, Deserialize, Default)]
pub struct ReviewExceptionRequest {
    pub notes: Option<String>,
}

/// POST /api/v1/exceptions/{exception_id}/approve
pub async fn approve_exception(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(exception_id): Path<i64>,
    body: Option<Json<ReviewExceptionRequest>>,
) -> impl IntoResponse {
    review(
        app_state.db(),
        exception_id,
        auth.0.sub,
        Status::Approved,
        body.and_then(|Json(b)| b.notes),
        "Exception request approved",
    )
    .await
}

/// POST /api/v1/exceptions/{exception_id}/reject
pub async fn reject_exception(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(exception_id): Path<i64>,
    body: Option<Json<ReviewExceptionRequest>>,
) -> impl IntoResponse {
    review(
        app_state.db(),
        exception_id,
        auth.0.sub,
        Status::Rejected,
        body.and_then(|Json(b)| b.notes),
        "Exception request rejected",
    )
    .await
}

/// Verdicts apply only to pending requests; the status update is a
/// compare-and-set so two racing reviewers cannot both decide.
async fn review(
    db: &DatabaseConnection,
    exception_id: i64,
    reviewer_id: i64,
    verdict: Status,
    notes: Option<String>,
    message: &str,
) -> axum::response::Response {
    let result = async {
        exception_request::Entity::find_by_id(exception_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Exception request"))?;

        let updated = exception_request::Entity::update_many()
            .col_expr(exception_request::Column::Status, Expr::value(verdict))
            .col_expr(
                exception_request::Column::ReviewedBy,
                Expr::value(Some(reviewer_id)),
            )
            .col_expr(exception_request::Column::AdminNotes, Expr::value(notes))
            .col_expr(exception_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(exception_request::Column::Id.eq(exception_id))
            .filter(exception_request::Column::Status.eq(Status::Pending))
            .exec(db)
            .await?;
        if updated.rows_affected == 0 {
            return Err(DomainError::Conflict);
        }

        exception_request::Entity::find_by_id(exception_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Exception request"))
    }
    .await;

    match result {
        Ok(request) => Json(ApiResponse::success(request, message)).into_response(),
        Err(e) => domain_error(e),
    }
}
