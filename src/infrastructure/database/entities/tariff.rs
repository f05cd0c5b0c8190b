//! Grid operator tariff entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tariff model - pricing a household can sign a supply contract on
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tariffs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning grid operator
    pub operator_id: i32,

    /// Globally unique tariff name
    #[sea_orm(unique)]
    pub name: String,

    /// Price per kWh in cents
    pub price_per_kwh_cents: i64,

    /// Yearly base fee in cents
    pub base_fee_cents: i64,

    /// Contract term in months
    pub term_months: i32,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contract::Entity")]
    Contracts,
}

impl Related<super::contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contracts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
