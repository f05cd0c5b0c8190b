//! PV installation request entity
//!
//! Enum-valued columns (`status`, `mounting_system`, `shading`,
//! `orientation`) hold the domain enums' string forms.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "installation_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    pub installer_id: Option<i32>,
    pub grid_operator_id: Option<i32>,
    pub certificate_id: Option<i32>,
    pub status: String,
    pub grid_compatible: Option<bool>,
    pub module_type: Option<String>,
    pub capacity_kw: Option<f64>,
    pub area_m2: Option<f64>,
    pub mounting_system: Option<String>,
    pub shading: Option<String>,
    pub orientation: Option<String>,
    pub inclination_deg: Option<f64>,
    pub offer_cost_cents: Option<i64>,
    pub notes: Option<String>,
    pub feed_in_granted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::offer::Entity")]
    Offer,
}

impl Related<super::offer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
