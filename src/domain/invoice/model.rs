//! Invoice entity

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceCategory {
    GridOperatorInvoice,
    ConsultantInvoice,
    InstallerInvoice,
}

impl InvoiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GridOperatorInvoice => "GridOperatorInvoice",
            Self::ConsultantInvoice => "ConsultantInvoice",
            Self::InstallerInvoice => "InstallerInvoice",
        }
    }
}

impl std::fmt::Display for InvoiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GridOperatorInvoice" => Ok(Self::GridOperatorInvoice),
            "ConsultantInvoice" => Ok(Self::ConsultantInvoice),
            "InstallerInvoice" => Ok(Self::InstallerInvoice),
            other => Err(format!("unknown invoice category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Open,
    Paid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Paid => write!(f, "Paid"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Paid" => Ok(Self::Paid),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// Invoice issued by an operator, consultant or installer to a household.
///
/// Only `payment_status` changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: i32,
    pub issuer_id: i32,
    pub recipient_id: i32,
    pub contract_id: Option<i32>,
    pub request_id: Option<i32>,
    pub certificate_id: Option<i32>,
    pub amount_cents: i64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub category: InvoiceCategory,
    pub payment_status: PaymentStatus,
    /// Recurring billing period; the idempotency key of the billing cycle
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(
        issuer_id: i32,
        recipient_id: i32,
        category: InvoiceCategory,
        amount_cents: i64,
        issue_date: NaiveDate,
        due_days: u32,
    ) -> Self {
        Self {
            id: 0,
            issuer_id,
            recipient_id,
            contract_id: None,
            request_id: None,
            certificate_id: None,
            amount_cents,
            issue_date,
            due_date: issue_date + Duration::days(i64::from(due_days)),
            category,
            payment_status: PaymentStatus::Open,
            period_start: None,
            period_end: None,
            created_at: Utc::now(),
        }
    }

    pub fn for_contract(mut self, contract_id: i32) -> Self {
        self.contract_id = Some(contract_id);
        self
    }

    pub fn for_request(mut self, request_id: i32) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn for_certificate(mut self, certificate_id: i32) -> Self {
        self.certificate_id = Some(certificate_id);
        self
    }

    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.period_start = Some(start);
        self.period_end = Some(end);
        self
    }

    pub fn is_party(&self, user_id: i32) -> bool {
        self.issuer_id == user_id || self.recipient_id == user_id
    }
}
