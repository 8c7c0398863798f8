use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Workflow record for one offering's grade sheet. At most one per offering.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "grade_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub offering_id: i64,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "grade_submission_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    /// Teacher is still editing structure and scores.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Awaiting administrator review. Read-only for the teacher.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Sent back for correction. Teacher may edit and submit again.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Terminal. Final grades have been written to enrollments.
    #[sea_orm(string_value = "published")]
    Published,
}

impl Status {
    /// Structure and score edits are only allowed while the teacher holds
    /// the sheet.
    pub fn is_editable(&self) -> bool {
        matches!(self, Status::Draft | Status::Rejected)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::offering::Entity",
        from = "Column::OfferingId",
        to = "super::offering::Column::Id"
    )]
    Offering,
    #[sea_orm(has_many = "super::workflow_log::Entity")]
    WorkflowLog,
}

impl Related<super::offering::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offering.def()
    }
}

impl Related<super::workflow_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkflowLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
