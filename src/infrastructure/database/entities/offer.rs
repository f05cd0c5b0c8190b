//! Installer offer, at most one per installation request

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "offers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub request_id: i32,
    pub installer_id: i32,
    pub cost_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::installation_request::Entity",
        from = "Column::RequestId",
        to = "super::installation_request::Column::Id",
        on_delete = "Cascade"
    )]
    InstallationRequest,
}

impl Related<super::installation_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstallationRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
