//! Energy certificate (Energieausweis) entity

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    pub consultant_id: Option<i32>,
    pub status: String,
    pub measure_id: Option<i32>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub price_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::efficiency_measure::Entity")]
    Measures,
}

impl Related<super::efficiency_measure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Measures.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
