//! Invoice entity

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub issuer_id: i32,
    pub recipient_id: i32,
    pub contract_id: Option<i32>,
    pub request_id: Option<i32>,
    pub certificate_id: Option<i32>,
    pub amount_cents: i64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub category: String,
    pub payment_status: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
