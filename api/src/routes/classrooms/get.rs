use axum::{Json, extract::State, response::IntoResponse};
use sea_orm::{EntityTrait, QueryOrder};
use util::state::AppState;

use crate::response::{ApiResponse, domain_error};
use db::models::classroom;

/// GET /api/v1/classrooms
pub async fn list_classrooms(State(app_state): State<AppState>) -> impl IntoResponse {
    match classroom::Entity::find()
        .order_by_asc(classroom::Column::Code)
        .all(app_state.db())
        .await
    {
        Ok(rooms) => {
            Json(ApiResponse::success(rooms, "Classrooms retrieved successfully")).into_response()
        }
        Err(e) => domain_error(e.into()),
    }
}
