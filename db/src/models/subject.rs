use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::offering::Entity")]
    Offering,
}

impl Related<super::offering::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offering.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// IDs of subjects that must be passed before enrolling in this one.
    pub async fn prerequisite_ids(&self, db: &DatabaseConnection) -> Result<Vec<i64>, DbErr> {
        use sea_orm::QueryFilter;

        let rows = super::subject_prerequisite::Entity::find()
            .filter(super::subject_prerequisite::Column::SubjectId.eq(self.id))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| r.prerequisite_id).collect())
    }
}
