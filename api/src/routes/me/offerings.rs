use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, domain_error};
use crate::routes::common::require_student;
use crate::routes::offerings::get::{OfferingItem, hydrate};
use db::models::{enrollment_period, offering};
use db::{DomainError, eligibility};

#[derive(Debug, Serialize)]
pub struct CatalogItem {
    #[serde(flatten)]
    pub offering: OfferingItem,
    pub eligibility: eligibility::EligibilityReport,
}

#[derive(Debug, Serialize, Default)]
pub struct CatalogResponse {
    pub period: Option<enrollment_period::Model>,
    pub offerings: Vec<CatalogItem>,
}

/// GET /api/v1/me/offerings
///
/// The catalog for the currently open period, with a full eligibility
/// report per offering. Outside any open period the catalog is empty.
pub async fn list_catalog(
    State(app_state): State<AppState>,
    auth: AuthUser,
) -> impl IntoResponse {
    let db = app_state.db();
    let now = Utc::now();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;

        let Some(period) = enrollment_period::Model::current_open(db, now).await? else {
            return Ok(CatalogResponse::default());
        };

        let offerings = offering::Entity::find()
            .filter(offering::Column::PeriodId.eq(period.id))
            .order_by_asc(offering::Column::Id)
            .all(db)
            .await?;

        let mut items = Vec::with_capacity(offerings.len());
        for item in hydrate(db, offerings).await? {
            let report = eligibility::check(db, &student, item.offering.id, now).await?;
            items.push(CatalogItem {
                offering: item,
                eligibility: report,
            });
        }

        Ok::<_, DomainError>(CatalogResponse {
            period: Some(period),
            offerings: items,
        })
    }
    .await;

    match result {
        Ok(catalog) => {
            Json(ApiResponse::success(catalog, "Catalog retrieved successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}

/// GET /api/v1/me/eligibility/{offering_id}
///
/// Read-only eligibility report. Always `200 OK`; the verdict and the full
/// reason list live in the body.
pub async fn check_eligibility(
    State(app_state): State<AppState>,
    auth: AuthUser,
    Path(offering_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let result = async {
        let student = require_student(db, auth.0.sub).await?;
        eligibility::check(db, &student, offering_id, Utc::now()).await
    }
    .await;

    match result {
        Ok(report) => {
            Json(ApiResponse::success(report, "Eligibility evaluated successfully")).into_response()
        }
        Err(e) => domain_error(e),
    }
}
