use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Join table: `subject_id` requires `prerequisite_id` to be passed first.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subject_prerequisites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub subject_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub prerequisite_id: i64,
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
        belongs_to = "super::subject::Entity",
        from = "Column::PrerequisiteId",
        to = "super::subject::Column::Id"
    )]
    Prerequisite,
}

impl ActiveModelBehavior for ActiveModel {}
