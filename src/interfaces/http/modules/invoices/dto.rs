//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Invoice;

/// Invoice in euro cents. Only `payment_status` ever changes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: i32,
    pub issuer_id: i32,
    pub recipient_id: i32,
    pub contract_id: Option<i32>,
    pub request_id: Option<i32>,
    pub certificate_id: Option<i32>,
    pub amount_cents: i64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// GridOperatorInvoice | ConsultantInvoice | InstallerInvoice
    pub category: String,
    /// Open | Paid
    pub payment_status: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(i: Invoice) -> Self {
        Self {
            id: i.id,
            issuer_id: i.issuer_id,
            recipient_id: i.recipient_id,
            contract_id: i.contract_id,
            request_id: i.request_id,
            certificate_id: i.certificate_id,
            amount_cents: i.amount_cents,
            issue_date: i.issue_date,
            due_date: i.due_date,
            category: i.category.to_string(),
            payment_status: i.payment_status.to_string(),
            period_start: i.period_start,
            period_end: i.period_end,
            created_at: i.created_at,
        }
    }
}
