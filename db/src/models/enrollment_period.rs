use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryFilter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "enrollment_periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Status,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "enrollment_period_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
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
    /// A period accepts enrollment writes only while explicitly open AND
    /// inside its date window.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == Status::Open && now >= self.start_date && now <= self.end_date
    }

    /// The period currently accepting enrollments, if any.
    pub async fn current_open(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        let open = Entity::find()
            .filter(Column::Status.eq(Status::Open))
            .all(db)
            .await?;
        Ok(open.into_iter().find(|p| p.is_open_at(now)))
    }
}
