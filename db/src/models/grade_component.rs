use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One assessed item in an offering's grade structure, e.g. "Exam" worth 60%.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "grade_components")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub offering_id: i64,
    pub name: String,
    pub max_score: f64,
    /// Integer percentage of the final grade. All components of an offering
    /// must total exactly 100.
    pub weight_percent: i32,
    pub ordinal: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::offering::Entity",
        from = "Column::OfferingId",
        to = "super::offering::Column::Id"
    )]
    Offering,
    #[sea_orm(has_many = "super::student_grade::Entity")]
    StudentGrade,
}

impl Related<super::offering::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offering.def()
    }
}

impl Related<super::student_grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentGrade.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
