use axum::{Json, extract::State, response::IntoResponse};
use sea_orm::{EntityTrait, QueryOrder};
use util::state::AppState;

use crate::response::{ApiResponse, domain_error};
use db::models::enrollment_period;

/// GET /api/v1/periods
///
/// All enrollment periods, newest first.
pub async fn list_periods(State(app_state): State<AppState>) -> impl IntoResponse {
    match enrollment_period::Entity::find()
        .order_by_desc(enrollment_period::Column::StartDate)
        .all(app_state.db())
        .await
    {
        Ok(periods) => Json(ApiResponse::success(
            periods,
            "Enrollment periods retrieved successfully",
        ))
        .into_response(),
        Err(e) => domain_error(e.into()),
    }
}
