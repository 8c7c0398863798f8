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
use db::models::{offering, schedule_slot, subject};

#[derive(Debug, Deserialize)]
pub struct ListOfferingsQuery {
    pub period_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OfferingItem {
    #[serde(flatten)]
    pub offering: offering::Model,
    pub subject_code: String,
    pub subject_name: String,
    pub slots: Vec<schedule_slot::Model>,
    pub enrolled: u64,
}

/// GET /api/v1/offerings?period_id=
///
/// Offerings with their subject, weekly slots and seats taken.
pub async fn list_offerings(
    State(app_state): State<AppState>,
    Query(query): Query<ListOfferingsQuery>,
) -> impl IntoResponse {
    let db = app_state.db();

    let mut finder = offering::Entity::find().order_by_asc(offering::Column::Id);
    if let Some(period_id) = query.period_id {
        finder = finder.filter(offering::Column::PeriodId.eq(period_id));
    }
    let offerings = match finder.all(db).await {
        Ok(o) => o,
        Err(e) => return domain_error(e.into()),
    };

    match hydrate(db, offerings).await {
        Ok(items) => {
            Json(ApiResponse::success(items, "Offerings retrieved successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

/// Attaches subject info, slots and the live seat count to each offering.
pub async fn hydrate(
    db: &sea_orm::DatabaseConnection,
    offerings: Vec<offering::Model>,
) -> Result<Vec<OfferingItem>, DomainError> {
    let subject_ids: Vec<i64> = offerings.iter().map(|o| o.subject_id).collect();
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

    let offering_ids: Vec<i64> = offerings.iter().map(|o| o.id).collect();
    let mut slots: HashMap<i64, Vec<schedule_slot::Model>> = HashMap::new();
    if !offering_ids.is_empty() {
        for slot in schedule_slot::Entity::find()
            .filter(schedule_slot::Column::OfferingId.is_in(offering_ids))
            .all(db)
            .await?
        {
            slots.entry(slot.offering_id).or_default().push(slot);
        }
    }

    let mut items = Vec::with_capacity(offerings.len());
    for off in offerings {
        let enrolled = off.enrolled_count(db).await?;
        let (subject_code, subject_name) = subjects
            .get(&off.subject_id)
            .map(|s| (s.code.clone(), s.name.clone()))
            .unwrap_or_default();
        items.push(OfferingItem {
            slots: slots.remove(&off.id).unwrap_or_default(),
            subject_code,
            subject_name,
            enrolled,
            offering: off,
        });
    }
    Ok(items)
}
