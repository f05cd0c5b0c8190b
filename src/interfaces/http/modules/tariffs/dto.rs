//! Tariff DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::services::TariffInput;
use crate::domain::Tariff;

/// Electricity tariff offered by a grid operator. Prices in euro cents.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TariffResponse {
    pub id: i32,
    pub operator_id: i32,
    pub name: String,
    pub price_per_kwh_cents: i64,
    pub base_fee_cents: i64,
    pub term_months: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tariff> for TariffResponse {
    fn from(t: Tariff) -> Self {
        Self {
            id: t.id,
            operator_id: t.operator_id,
            name: t.name,
            price_per_kwh_cents: t.price_per_kwh_cents,
            base_fee_cents: t.base_fee_cents,
            term_months: t.term_months,
            is_active: t.is_active,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Body of both create and update; all fields are replaced on update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TariffRequest {
    #[validate(length(min = 1, max = 100, message = "Tarifname ist erforderlich"))]
    pub name: String,
    pub price_per_kwh_cents: i64,
    pub base_fee_cents: i64,
    pub term_months: u32,
}

impl From<TariffRequest> for TariffInput {
    fn from(r: TariffRequest) -> Self {
        Self {
            name: r.name,
            price_per_kwh_cents: r.price_per_kwh_cents,
            base_fee_cents: r.base_fee_cents,
            term_months: r.term_months,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTariffActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AnnualChargeQuery {
    /// Yearly consumption in kWh; defaults to the configured household figure
    pub consumption_kwh: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnnualChargeResponse {
    pub tariff_id: i32,
    pub consumption_kwh: u32,
    pub annual_charge_cents: i64,
}
