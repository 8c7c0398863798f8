use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, PaginatorTrait, QueryFilter};
use serde::Serialize;

/// A scheduled instance of a subject taught by a teacher in a classroom
/// during one enrollment period.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "offerings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub classroom_id: i64,
    pub period_id: i64,
    pub max_quota: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id"
    )]
    Classroom,
    #[sea_orm(
        belongs_to = "super::enrollment_period::Entity",
        from = "Column::PeriodId",
        to = "super::enrollment_period::Column::Id"
    )]
    Period,
    #[sea_orm(has_many = "super::schedule_slot::Entity")]
    ScheduleSlot,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::enrollment_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Period.def()
    }
}

impl Related<super::schedule_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleSlot.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn slots(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<super::schedule_slot::Model>, DbErr> {
        super::schedule_slot::Entity::find()
            .filter(super::schedule_slot::Column::OfferingId.eq(self.id))
            .all(db)
            .await
    }

    /// Number of seats currently taken (active enrollments only).
    pub async fn enrolled_count(&self, db: &DatabaseConnection) -> Result<u64, DbErr> {
        super::enrollment::Entity::find()
            .filter(super::enrollment::Column::OfferingId.eq(self.id))
            .filter(super::enrollment::Column::Status.eq(super::enrollment::Status::Active))
            .count(db)
            .await
    }
}
