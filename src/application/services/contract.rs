//! Contracts and cancellations

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::application::identity::require_role;
use crate::domain::contract::CancellationSettlement;
use crate::domain::invoice::calendar::prorated_amount_cents;
use crate::domain::{
    CancellationAction, CancellationRequest, Contract, DomainError, DomainResult, Invoice,
    InvoiceCategory, RepositoryProvider, Tariff, User, UserRole,
};

/// Result of an operator decision on a pending cancellation.
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub contract: Contract,
    /// Prorated closing invoice, only on confirm
    pub invoice: Option<Invoice>,
    pub replacement: Option<Contract>,
}

pub struct ContractService {
    repos: Arc<dyn RepositoryProvider>,
    annual_consumption_kwh: u32,
    invoice_due_days: u32,
}

impl ContractService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        annual_consumption_kwh: u32,
        invoice_due_days: u32,
    ) -> Self {
        Self {
            repos,
            annual_consumption_kwh,
            invoice_due_days,
        }
    }

    async fn load(&self, id: i32) -> DomainResult<Contract> {
        self.repos
            .contracts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", id))
    }

    /// Tariff a new contract can be signed on.
    async fn signable_tariff(&self, tariff_id: i32) -> DomainResult<Tariff> {
        let tariff = self
            .repos
            .tariffs()
            .find_by_id(tariff_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tariff", tariff_id))?;
        if !tariff.is_active {
            return Err(DomainError::Precondition(format!(
                "Tarif {} ist nicht aktiv",
                tariff_id
            )));
        }
        Ok(tariff)
    }

    /// The household must not already hold an open contract on the
    /// replacement tariff. Replacing a contract with its own tariff is
    /// allowed, the old contract closes in the same settlement.
    async fn ensure_replacement_free(
        &self,
        contract: &Contract,
        replacement_tariff_id: i32,
    ) -> DomainResult<()> {
        if replacement_tariff_id == contract.tariff_id {
            return Ok(());
        }
        if self
            .repos
            .contracts()
            .exists_open_for(contract.household_id, replacement_tariff_id)
            .await?
        {
            return Err(DomainError::Conflict(format!(
                "Haushalt {} hat bereits einen Vertrag für Tarif {}",
                contract.household_id, replacement_tariff_id
            )));
        }
        Ok(())
    }

    pub async fn create(&self, actor: &User, tariff_id: i32, today: NaiveDate) -> DomainResult<Contract> {
        require_role(actor, &[UserRole::Household])?;
        let tariff = self.signable_tariff(tariff_id).await?;
        if self
            .repos
            .contracts()
            .exists_open_for(actor.id, tariff_id)
            .await?
        {
            return Err(DomainError::Conflict(format!(
                "Es besteht bereits ein Vertrag für Tarif {}",
                tariff_id
            )));
        }

        let contract = Contract::new(actor.id, &tariff, today, self.annual_consumption_kwh)?;
        let contract = self.repos.contracts().create(contract).await?;
        info!(
            contract_id = contract.id,
            household_id = actor.id,
            tariff_id,
            annual_charge_cents = contract.annual_charge_cents,
            "Contract created"
        );
        Ok(contract)
    }

    pub async fn get(&self, actor: &User, id: i32) -> DomainResult<Contract> {
        let contract = self.load(id).await?;
        let allowed = actor.role == UserRole::Admin
            || contract.household_id == actor.id
            || contract.operator_id == actor.id;
        if !allowed {
            return Err(DomainError::Forbidden(format!("Kein Zugriff auf Vertrag {}", id)));
        }
        Ok(contract)
    }

    pub async fn list(&self, actor: &User) -> DomainResult<Vec<Contract>> {
        match actor.role {
            UserRole::Household => self.repos.contracts().list_by_household(actor.id).await,
            UserRole::GridOperator => self.repos.contracts().list_by_operator(actor.id).await,
            UserRole::Admin => self.repos.contracts().list_open().await,
            _ => Err(DomainError::Forbidden(format!(
                "Rolle {} hat keine Verträge",
                actor.role
            ))),
        }
    }

    /// Household owner or the contract's operator may ask for cancellation.
    pub async fn request_cancellation(
        &self,
        actor: &User,
        contract_id: i32,
        replacement_tariff_id: Option<i32>,
    ) -> DomainResult<CancellationRequest> {
        require_role(actor, &[UserRole::Household, UserRole::GridOperator])?;
        let mut contract = self.load(contract_id).await?;
        if contract.household_id != actor.id && contract.operator_id != actor.id {
            return Err(DomainError::Forbidden(format!(
                "Kein Zugriff auf Vertrag {}",
                contract_id
            )));
        }
        contract.request_cancellation()?;
        if let Some(tariff_id) = replacement_tariff_id {
            self.signable_tariff(tariff_id).await?;
            self.ensure_replacement_free(&contract, tariff_id).await?;
        }

        let request = self
            .repos
            .contracts()
            .open_cancellation(CancellationRequest::new(
                contract_id,
                actor.id,
                replacement_tariff_id,
            ))
            .await?;
        info!(contract_id, cancellation_id = request.id, ?replacement_tariff_id, "Cancellation requested");
        Ok(request)
    }

    pub async fn pending_cancellations(&self, actor: &User) -> DomainResult<Vec<CancellationRequest>> {
        require_role(actor, &[UserRole::GridOperator])?;
        self.repos.contracts().list_pending_cancellations(actor.id).await
    }

    /// Confirm or reject a pending cancellation. `action` is `confirm` or
    /// `reject`; anything else is a bad request.
    pub async fn resolve_cancellation(
        &self,
        actor: &User,
        contract_id: i32,
        action: &str,
        today: NaiveDate,
    ) -> DomainResult<CancellationOutcome> {
        require_role(actor, &[UserRole::GridOperator, UserRole::Admin])?;
        let action: CancellationAction = action.parse()?;
        let mut contract = self.load(contract_id).await?;
        if actor.role != UserRole::Admin && contract.operator_id != actor.id {
            return Err(DomainError::Forbidden(format!(
                "Vertrag {} gehört einem anderen Netzbetreiber",
                contract_id
            )));
        }

        match action {
            CancellationAction::Reject => {
                contract.reject_cancellation()?;
                let pending = self.pending_for(contract_id).await?;
                self.repos
                    .contracts()
                    .reject_cancellation(contract_id, pending.id)
                    .await?;
                info!(contract_id, "Cancellation rejected");
                Ok(CancellationOutcome {
                    contract,
                    invoice: None,
                    replacement: None,
                })
            }
            CancellationAction::Confirm => {
                contract.confirm_cancellation()?;
                let pending = self.pending_for(contract_id).await?;

                let replacement = match pending.replacement_tariff_id {
                    Some(tariff_id) => {
                        let tariff = self.signable_tariff(tariff_id).await?;
                        self.ensure_replacement_free(&contract, tariff_id).await?;
                        Some(Contract::new(
                            contract.household_id,
                            &tariff,
                            today,
                            self.annual_consumption_kwh,
                        )?)
                    }
                    None => None,
                };
                let invoice = Invoice::new(
                    contract.operator_id,
                    contract.household_id,
                    InvoiceCategory::GridOperatorInvoice,
                    prorated_amount_cents(contract.annual_charge_cents, today),
                    today,
                    self.invoice_due_days,
                )
                .for_contract(contract_id);

                let settled = self
                    .repos
                    .contracts()
                    .settle_cancellation(CancellationSettlement {
                        contract_id,
                        cancellation_id: pending.id,
                        invoice,
                        replacement,
                    })
                    .await?;
                metrics::counter!("invoices_created_total", "category" => "cancellation").increment(1);

                info!(
                    contract_id,
                    invoice_id = settled.invoice.id,
                    amount_cents = settled.invoice.amount_cents,
                    replacement_id = settled.replacement.as_ref().map(|c| c.id),
                    "Cancellation confirmed"
                );
                Ok(CancellationOutcome {
                    contract,
                    invoice: Some(settled.invoice),
                    replacement: settled.replacement,
                })
            }
        }
    }

    async fn pending_for(&self, contract_id: i32) -> DomainResult<CancellationRequest> {
        self.repos
            .contracts()
            .find_pending_cancellation(contract_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "CancellationRequest",
                field: "contract_id",
                value: contract_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;
    use crate::domain::ContractStatus;
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        svc: ContractService,
        repos: Arc<InMemoryStorage>,
        household: User,
        operator: User,
        tariff: Tariff,
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn user(repos: &InMemoryStorage, email: &str, role: UserRole) -> User {
        repos
            .users()
            .create(NewUser {
                name: email.into(),
                email: email.into(),
                password_hash: "x".into(),
                role,
            })
            .await
            .unwrap()
    }

    async fn tariff(repos: &InMemoryStorage, operator: &User, name: &str) -> Tariff {
        repos
            .tariffs()
            .save(Tariff::new(operator.id, name.into(), 30, 12_000, 12))
            .await
            .unwrap()
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryStorage::new());
        let household = user(&repos, "hh@example.de", UserRole::Household).await;
        let operator = user(&repos, "netz@example.de", UserRole::GridOperator).await;
        let tariff = tariff(&repos, &operator, "Basis").await;
        Fixture {
            svc: ContractService::new(repos.clone(), 3500, 30),
            repos,
            household,
            operator,
            tariff,
        }
    }

    #[tokio::test]
    async fn one_open_contract_per_tariff() {
        let f = fixture().await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        assert_eq!(c.annual_charge_cents, 12_000 + 30 * 3500);
        assert_eq!(c.end_date, day(2026, 1, 1));
        assert!(matches!(
            f.svc.create(&f.household, f.tariff.id, day(2025, 1, 2)).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn cancellation_twice_conflicts() {
        let f = fixture().await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc.request_cancellation(&f.household, c.id, None).await.unwrap();
        assert!(matches!(
            f.svc.request_cancellation(&f.household, c.id, None).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            f.svc.request_cancellation(&f.household, 404, None).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn confirm_prorates_and_cancels() {
        let f = fixture().await;
        let t = f
            .repos
            .tariffs()
            .save(Tariff::new(f.operator.id, "Glatt".into(), 0, 36_500, 12))
            .await
            .unwrap();
        let c = f.svc.create(&f.household, t.id, day(2025, 1, 1)).await.unwrap();
        assert_eq!(c.annual_charge_cents, 36_500);
        f.svc.request_cancellation(&f.household, c.id, None).await.unwrap();

        // 2025-04-10 is day 100
        let outcome = f
            .svc
            .resolve_cancellation(&f.operator, c.id, "confirm", day(2025, 4, 10))
            .await
            .unwrap();
        assert_eq!(outcome.contract.status, ContractStatus::Cancelled);
        let invoice = outcome.invoice.unwrap();
        assert_eq!(invoice.amount_cents, 10_000);
        assert_eq!(invoice.issue_date, day(2025, 4, 10));
        assert_eq!(invoice.due_date, day(2025, 5, 10));
        assert!(outcome.replacement.is_none());

        let stored = f.repos.contracts().find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Cancelled);
        assert!(f.svc.pending_cancellations(&f.operator).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirm_with_replacement_starts_new_contract() {
        let f = fixture().await;
        let next = tariff(&f.repos, &f.operator, "Öko").await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc
            .request_cancellation(&f.household, c.id, Some(next.id))
            .await
            .unwrap();

        let outcome = f
            .svc
            .resolve_cancellation(&f.operator, c.id, "confirm", day(2025, 6, 1))
            .await
            .unwrap();
        let replacement = outcome.replacement.unwrap();
        assert_eq!(replacement.tariff_id, next.id);
        assert_eq!(replacement.start_date, day(2025, 6, 1));
        assert_eq!(replacement.status, ContractStatus::Running);
        assert_eq!(f.svc.list(&f.household).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn replacement_tariff_already_held_conflicts() {
        let f = fixture().await;
        let other = tariff(&f.repos, &f.operator, "Öko").await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc.create(&f.household, other.id, day(2025, 1, 1)).await.unwrap();

        assert!(matches!(
            f.svc.request_cancellation(&f.household, c.id, Some(other.id)).await,
            Err(DomainError::Conflict(_))
        ));
        let stored = f.repos.contracts().find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Running);
    }

    #[tokio::test]
    async fn confirm_refuses_replacement_signed_meanwhile() {
        let f = fixture().await;
        let other = tariff(&f.repos, &f.operator, "Öko").await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc
            .request_cancellation(&f.household, c.id, Some(other.id))
            .await
            .unwrap();
        f.svc.create(&f.household, other.id, day(2025, 2, 1)).await.unwrap();

        assert!(matches!(
            f.svc
                .resolve_cancellation(&f.operator, c.id, "confirm", day(2025, 3, 1))
                .await,
            Err(DomainError::Conflict(_))
        ));
        let open_on_other = f
            .svc
            .list(&f.household)
            .await
            .unwrap()
            .into_iter()
            .filter(|k| k.tariff_id == other.id && k.status != ContractStatus::Cancelled)
            .count();
        assert_eq!(open_on_other, 1);
        let stored = f.repos.contracts().find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::CancellationPending);
    }

    #[tokio::test]
    async fn replacement_on_same_tariff_is_allowed() {
        let f = fixture().await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc
            .request_cancellation(&f.household, c.id, Some(f.tariff.id))
            .await
            .unwrap();
        let outcome = f
            .svc
            .resolve_cancellation(&f.operator, c.id, "confirm", day(2025, 7, 1))
            .await
            .unwrap();
        assert_eq!(outcome.replacement.unwrap().tariff_id, f.tariff.id);
    }

    #[tokio::test]
    async fn reject_returns_to_running() {
        let f = fixture().await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc.request_cancellation(&f.household, c.id, None).await.unwrap();
        assert_eq!(f.svc.pending_cancellations(&f.operator).await.unwrap().len(), 1);

        let outcome = f
            .svc
            .resolve_cancellation(&f.operator, c.id, "reject", day(2025, 2, 1))
            .await
            .unwrap();
        assert_eq!(outcome.contract.status, ContractStatus::Running);
        assert!(outcome.invoice.is_none());
        let stored = f.repos.contracts().find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Running);
    }

    #[tokio::test]
    async fn unknown_action_is_bad_request() {
        let f = fixture().await;
        let c = f.svc.create(&f.household, f.tariff.id, day(2025, 1, 1)).await.unwrap();
        f.svc.request_cancellation(&f.household, c.id, None).await.unwrap();
        assert!(matches!(
            f.svc
                .resolve_cancellation(&f.operator, c.id, "later", day(2025, 2, 1))
                .await,
            Err(DomainError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn inactive_tariff_cannot_be_signed() {
        let f = fixture().await;
        let mut t = f.tariff.clone();
        t.is_active = false;
        f.repos.tariffs().update(&t).await.unwrap();
        assert!(matches!(
            f.svc.create(&f.household, t.id, day(2025, 1, 1)).await,
            Err(DomainError::Precondition(_))
        ));
    }
}
