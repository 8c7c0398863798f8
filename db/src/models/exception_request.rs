use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryFilter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A student's request to bypass one eligibility rule, reviewed by an
/// administrator. An approved request overrides the matching rule during
/// eligibility evaluation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "exception_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub kind: Kind,
    /// The offering the request is about, where applicable. A
    /// `skip_prerequisite` request names the offering whose subject's
    /// prerequisite is being waived.
    pub offering_id: Option<i64>,
    pub reason: String,
    pub status: Status,
    pub reviewed_by: Option<i64>,
    pub admin_notes: Option<String>,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "exception_kind")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Kind {
    /// Enroll beyond the per-student subject limit.
    #[sea_orm(string_value = "extra_subject")]
    ExtraSubject,
    /// Waive a missing prerequisite for one offering's subject.
    #[sea_orm(string_value = "skip_prerequisite")]
    SkipPrerequisite,
    /// Enroll despite a timetable clash with an existing enrollment.
    #[sea_orm(string_value = "schedule_conflict")]
    ScheduleConflict,
    /// Take a seat in an offering that is already full.
    #[sea_orm(string_value = "quota_override")]
    QuotaOverride,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "exception_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::offering::Entity",
        from = "Column::OfferingId",
        to = "super::offering::Column::Id"
    )]
    Offering,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReviewedBy",
        to = "super::user::Column::Id"
    )]
    Reviewer,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// All approved exceptions held by a student, used as overrides during
    /// eligibility evaluation.
    pub async fn approved_for_student(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(Status::Approved))
            .all(db)
            .await
    }
}
