use async_trait::async_trait;

use super::model::{CancellationRequest, Contract};
use crate::domain::invoice::Invoice;
use crate::domain::DomainResult;

/// Everything a confirmed cancellation writes.
#[derive(Debug, Clone)]
pub struct CancellationSettlement {
    pub contract_id: i32,
    pub cancellation_id: i32,
    pub invoice: Invoice,
    pub replacement: Option<Contract>,
}

/// Rows created by [`ContractRepository::settle_cancellation`].
#[derive(Debug, Clone)]
pub struct SettledCancellation {
    pub invoice: Invoice,
    pub replacement: Option<Contract>,
}

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn create(&self, contract: Contract) -> DomainResult<Contract>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Contract>>;
    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<Contract>>;
    async fn list_by_operator(&self, operator_id: i32) -> DomainResult<Vec<Contract>>;
    /// Contracts the billing cycle has to look at (status != Cancelled).
    async fn list_open(&self) -> DomainResult<Vec<Contract>>;

    async fn exists_open_for_tariff(&self, tariff_id: i32) -> DomainResult<bool>;
    async fn exists_open_for(&self, household_id: i32, tariff_id: i32) -> DomainResult<bool>;

    /// Sets the contract to `CancellationPending` and stores the request.
    async fn open_cancellation(
        &self,
        request: CancellationRequest,
    ) -> DomainResult<CancellationRequest>;
    async fn find_pending_cancellation(
        &self,
        contract_id: i32,
    ) -> DomainResult<Option<CancellationRequest>>;
    async fn list_pending_cancellations(
        &self,
        operator_id: i32,
    ) -> DomainResult<Vec<CancellationRequest>>;

    /// Cancels the contract, writes the prorated invoice and the optional
    /// replacement contract, all or nothing.
    async fn settle_cancellation(
        &self,
        settlement: CancellationSettlement,
    ) -> DomainResult<SettledCancellation>;

    /// Marks the cancellation rejected and sets the contract back to `Running`.
    async fn reject_cancellation(&self, contract_id: i32, cancellation_id: i32)
        -> DomainResult<()>;
}
