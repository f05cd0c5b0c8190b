use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{Invoice, InvoiceCategory};
use crate::domain::DomainResult;

/// Identifies one recurring-billing invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodKey {
    pub issuer_id: i32,
    pub contract_id: i32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub category: InvoiceCategory,
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Inserts an invoice. A second invoice for the same contract period
    /// fails with `Conflict`.
    async fn create(&self, invoice: Invoice) -> DomainResult<Invoice>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Invoice>>;
    /// Invoices the user issued or received, newest first.
    async fn list_for_party(&self, user_id: i32) -> DomainResult<Vec<Invoice>>;
    async fn list_all(&self) -> DomainResult<Vec<Invoice>>;
    async fn exists_for_period(&self, key: PeriodKey) -> DomainResult<bool>;
    async fn mark_paid(&self, id: i32) -> DomainResult<()>;
}
