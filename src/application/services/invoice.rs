//! Invoice reads, payment status and export

use std::sync::Arc;

use tracing::info;

use crate::application::services::export::invoices_to_csv;
use crate::domain::{
    DomainError, DomainResult, Invoice, PaymentStatus, RepositoryProvider, User, UserRole,
};

pub struct InvoiceService {
    repos: Arc<dyn RepositoryProvider>,
}

impl InvoiceService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Invoices the caller issued or received; every invoice for an admin.
    pub async fn list(&self, actor: &User) -> DomainResult<Vec<Invoice>> {
        if actor.role == UserRole::Admin {
            self.repos.invoices().list_all().await
        } else {
            self.repos.invoices().list_for_party(actor.id).await
        }
    }

    pub async fn get(&self, actor: &User, id: i32) -> DomainResult<Invoice> {
        let invoice = self
            .repos
            .invoices()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Invoice", id))?;
        if actor.role != UserRole::Admin && !invoice.is_party(actor.id) {
            return Err(DomainError::Forbidden(format!("Kein Zugriff auf Rechnung {}", id)));
        }
        Ok(invoice)
    }

    pub async fn mark_paid(&self, actor: &User, id: i32) -> DomainResult<Invoice> {
        let mut invoice = self.get(actor, id).await?;
        if !invoice.is_party(actor.id) {
            return Err(DomainError::Forbidden(format!(
                "Nur Aussteller oder Empfänger können Rechnung {} begleichen",
                id
            )));
        }
        if invoice.payment_status == PaymentStatus::Paid {
            return Err(DomainError::Conflict(format!("Rechnung {} ist bereits bezahlt", id)));
        }
        self.repos.invoices().mark_paid(id).await?;
        invoice.payment_status = PaymentStatus::Paid;
        info!(invoice_id = id, actor_id = actor.id, "Invoice marked paid");
        Ok(invoice)
    }

    /// Semicolon-separated export of everything `list` returns.
    pub async fn export_csv(&self, actor: &User) -> DomainResult<String> {
        let invoices = self.list(actor).await?;
        invoices_to_csv(&invoices)
    }
}
