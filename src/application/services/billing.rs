//! Recurring contract billing
//!
//! `run_billing_cycle` walks every contract that is not cancelled and
//! issues the yearly grid-operator invoice once the contract anniversary
//! is reached. A run after downtime still catches up on the current
//! period.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::domain::invoice::calendar::due_billing_period;
use crate::domain::invoice::PeriodKey;
use crate::domain::{
    Contract, DomainError, DomainResult, Invoice, InvoiceCategory, RepositoryProvider,
};
use crate::shared::ShutdownSignal;

/// Counters of one billing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillingRunSummary {
    pub scanned: usize,
    pub invoiced: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum ContractOutcome {
    Invoiced(Invoice),
    Skipped,
}

pub struct BillingService {
    repos: Arc<dyn RepositoryProvider>,
    invoice_due_days: u32,
}

impl BillingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, invoice_due_days: u32) -> Self {
        Self {
            repos,
            invoice_due_days,
        }
    }

    /// One pass over all open contracts as of `today`.
    ///
    /// A failure on one contract is logged and counted; the run goes on.
    /// Only the initial contract scan can fail the whole run.
    pub async fn run_billing_cycle(&self, today: NaiveDate) -> DomainResult<BillingRunSummary> {
        let contracts = self.repos.contracts().list_open().await?;
        let mut summary = BillingRunSummary {
            scanned: contracts.len(),
            ..Default::default()
        };

        for contract in &contracts {
            match self.bill_contract(contract, today).await {
                Ok(ContractOutcome::Invoiced(invoice)) => {
                    summary.invoiced += 1;
                    metrics::counter!("invoices_created_total", "category" => "billing")
                        .increment(1);
                    info!(
                        contract_id = contract.id,
                        invoice_id = invoice.id,
                        period_start = ?invoice.period_start,
                        amount_cents = invoice.amount_cents,
                        "Billing invoice issued"
                    );
                }
                Ok(ContractOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    metrics::counter!("billing_cycle_failures_total").increment(1);
                    error!(contract_id = contract.id, error = %e, "Billing failed for contract");
                }
            }
        }

        info!(
            %today,
            scanned = summary.scanned,
            invoiced = summary.invoiced,
            skipped = summary.skipped,
            failed = summary.failed,
            "Billing cycle finished"
        );
        Ok(summary)
    }

    async fn bill_contract(
        &self,
        contract: &Contract,
        today: NaiveDate,
    ) -> DomainResult<ContractOutcome> {
        let Some((period_start, period_end)) =
            due_billing_period(contract.start_date, contract.end_date, today)?
        else {
            return Ok(ContractOutcome::Skipped);
        };

        let key = PeriodKey {
            issuer_id: contract.operator_id,
            contract_id: contract.id,
            period_start,
            period_end,
            category: InvoiceCategory::GridOperatorInvoice,
        };
        if self.repos.invoices().exists_for_period(key).await? {
            return Ok(ContractOutcome::Skipped);
        }

        let invoice = Invoice::new(
            contract.operator_id,
            contract.household_id,
            InvoiceCategory::GridOperatorInvoice,
            contract.annual_charge_cents,
            today,
            self.invoice_due_days,
        )
        .for_contract(contract.id)
        .with_period(period_start, period_end);

        match self.repos.invoices().create(invoice).await {
            Ok(invoice) => Ok(ContractOutcome::Invoiced(invoice)),
            // lost the race against a concurrent run; the unique index held
            Err(DomainError::Conflict(_)) => {
                warn!(contract_id = contract.id, %period_start, "Period already invoiced");
                Ok(ContractOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }
}

/// Spawn the periodic billing task. The first tick fires immediately so
/// a restart catches up on missed runs.
pub fn start_billing_scheduler(
    service: Arc<BillingService>,
    shutdown: ShutdownSignal,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "🧾 Billing scheduler started");

        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let today = Utc::now().date_naive();
                    if let Err(e) = service.run_billing_cycle(today).await {
                        warn!(error = %e, "Billing cycle aborted");
                    }
                }
                _ = shutdown.wait() => {
                    info!("🧾 Billing scheduler shutting down");
                    break;
                }
            }
        }

        info!("🧾 Billing scheduler stopped");
    })
}
