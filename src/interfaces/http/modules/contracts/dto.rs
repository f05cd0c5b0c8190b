//! Contract DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::services::CancellationOutcome;
use crate::domain::{CancellationRequest, Contract};
use crate::interfaces::http::modules::invoices::InvoiceResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContractResponse {
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

impl From<Contract> for ContractResponse {
    fn from(c: Contract) -> Self {
        Self {
            id: c.id,
            household_id: c.household_id,
            tariff_id: c.tariff_id,
            operator_id: c.operator_id,
            start_date: c.start_date,
            end_date: c.end_date,
            annual_charge_cents: c.annual_charge_cents,
            status: c.status.to_string(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContractRequest {
    pub tariff_id: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RequestCancellationRequest {
    /// Tariff to switch to once the operator confirms
    pub replacement_tariff_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveCancellationRequest {
    /// `confirm` or `reject`
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancellationResponse {
    pub id: i32,
    pub contract_id: i32,
    pub requested_by: i32,
    pub replacement_tariff_id: Option<i32>,
    pub confirmed: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<CancellationRequest> for CancellationResponse {
    fn from(c: CancellationRequest) -> Self {
        Self {
            id: c.id,
            contract_id: c.contract_id,
            requested_by: c.requested_by,
            replacement_tariff_id: c.replacement_tariff_id,
            confirmed: c.confirmed,
            created_at: c.created_at,
            resolved_at: c.resolved_at,
        }
    }
}

/// Outcome of an operator decision. `invoice` and `replacement` are only
/// present after a confirmation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancellationOutcomeResponse {
    pub contract: ContractResponse,
    pub invoice: Option<InvoiceResponse>,
    pub replacement: Option<ContractResponse>,
}

impl From<CancellationOutcome> for CancellationOutcomeResponse {
    fn from(o: CancellationOutcome) -> Self {
        Self {
            contract: o.contract.into(),
            invoice: o.invoice.map(Into::into),
            replacement: o.replacement.map(Into::into),
        }
    }
}
