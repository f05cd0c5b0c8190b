//! Supply contract entity

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    pub tariff_id: i32,
    pub operator_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub annual_charge_cents: i64,
    /// Running | CancellationPending | Cancelled
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tariff::Entity",
        from = "Column::TariffId",
        to = "super::tariff::Column::Id"
    )]
    Tariff,
    #[sea_orm(has_many = "super::cancellation_request::Entity")]
    CancellationRequests,
}

impl Related<super::tariff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tariff.def()
    }
}

impl Related<super::cancellation_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CancellationRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
