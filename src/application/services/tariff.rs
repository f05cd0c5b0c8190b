//! Tariff management for grid operators

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::identity::require_role;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Tariff, User, UserRole};

/// Editable tariff fields
#[derive(Debug, Clone)]
pub struct TariffInput {
    pub name: String,
    pub price_per_kwh_cents: i64,
    pub base_fee_cents: i64,
    pub term_months: u32,
}

impl TariffInput {
    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::BadRequest("tariff name must not be empty".into()));
        }
        if self.price_per_kwh_cents < 0 || self.base_fee_cents < 0 {
            return Err(DomainError::BadRequest("prices must not be negative".into()));
        }
        if self.term_months == 0 {
            return Err(DomainError::BadRequest("term must be at least one month".into()));
        }
        Ok(())
    }
}

pub struct TariffService {
    repos: Arc<dyn RepositoryProvider>,
}

impl TariffService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn get(&self, id: i32) -> DomainResult<Tariff> {
        self.repos
            .tariffs()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tariff", id))
    }

    /// Loads a tariff the caller may modify: the owning operator or an admin.
    async fn load_owned(&self, actor: &User, id: i32) -> DomainResult<Tariff> {
        require_role(actor, &[UserRole::GridOperator, UserRole::Admin])?;
        let tariff = self.get(id).await?;
        if actor.role != UserRole::Admin && tariff.operator_id != actor.id {
            return Err(DomainError::Forbidden(format!(
                "Tarif {} gehört einem anderen Netzbetreiber",
                id
            )));
        }
        Ok(tariff)
    }

    /// A tariff referenced by any contract that is not cancelled is locked.
    async fn ensure_unlocked(&self, tariff: &Tariff) -> DomainResult<()> {
        if self.repos.contracts().exists_open_for_tariff(tariff.id).await? {
            return Err(DomainError::Conflict(format!(
                "Tarif {} wird von einem laufenden Vertrag verwendet",
                tariff.id
            )));
        }
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, own_id: Option<i32>) -> DomainResult<()> {
        match self.repos.tariffs().find_by_name(name).await? {
            Some(existing) if Some(existing.id) != own_id => Err(DomainError::Conflict(format!(
                "Tarifname '{}' ist bereits vergeben",
                name
            ))),
            _ => Ok(()),
        }
    }

    pub async fn create(&self, actor: &User, input: TariffInput) -> DomainResult<Tariff> {
        require_role(actor, &[UserRole::GridOperator])?;
        input.validate()?;
        self.ensure_name_free(&input.name, None).await?;

        let tariff = self
            .repos
            .tariffs()
            .save(Tariff::new(
                actor.id,
                input.name,
                input.price_per_kwh_cents,
                input.base_fee_cents,
                input.term_months,
            ))
            .await?;
        info!(tariff_id = tariff.id, operator_id = actor.id, name = %tariff.name, "Tariff created");
        Ok(tariff)
    }

    pub async fn update(&self, actor: &User, id: i32, input: TariffInput) -> DomainResult<Tariff> {
        input.validate()?;
        let mut tariff = self.load_owned(actor, id).await?;
        self.ensure_unlocked(&tariff).await?;
        self.ensure_name_free(&input.name, Some(id)).await?;

        tariff.name = input.name;
        tariff.price_per_kwh_cents = input.price_per_kwh_cents;
        tariff.base_fee_cents = input.base_fee_cents;
        tariff.term_months = input.term_months;
        tariff.updated_at = Utc::now();
        self.repos.tariffs().update(&tariff).await?;

        info!(tariff_id = id, actor_id = actor.id, "Tariff updated");
        Ok(tariff)
    }

    pub async fn set_active(&self, actor: &User, id: i32, active: bool) -> DomainResult<Tariff> {
        let mut tariff = self.load_owned(actor, id).await?;
        self.ensure_unlocked(&tariff).await?;
        tariff.is_active = active;
        tariff.updated_at = Utc::now();
        self.repos.tariffs().update(&tariff).await?;
        info!(tariff_id = id, active, "Tariff activation changed");
        Ok(tariff)
    }

    pub async fn delete(&self, actor: &User, id: i32) -> DomainResult<()> {
        let tariff = self.load_owned(actor, id).await?;
        self.ensure_unlocked(&tariff).await?;
        self.repos.tariffs().delete(id).await?;
        info!(tariff_id = id, actor_id = actor.id, "Tariff deleted");
        Ok(())
    }

    pub async fn list_active(&self) -> DomainResult<Vec<Tariff>> {
        self.repos.tariffs().find_active().await
    }

    /// Operator's own tariffs; every tariff for an admin.
    pub async fn list_own(&self, actor: &User) -> DomainResult<Vec<Tariff>> {
        require_role(actor, &[UserRole::GridOperator, UserRole::Admin])?;
        if actor.role == UserRole::Admin {
            self.repos.tariffs().find_all().await
        } else {
            self.repos.tariffs().find_by_operator(actor.id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::user::NewUser;
    use crate::domain::contract::CancellationSettlement;
    use crate::domain::{CancellationRequest, Contract, Invoice, InvoiceCategory};
    use crate::infrastructure::storage::InMemoryStorage;

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

    fn input(name: &str) -> TariffInput {
        TariffInput {
            name: name.into(),
            price_per_kwh_cents: 32,
            base_fee_cents: 9_600,
            term_months: 12,
        }
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let repos = Arc::new(InMemoryStorage::new());
        let op = user(&repos, "netz@example.de", UserRole::GridOperator).await;
        let svc = TariffService::new(repos.clone());
        svc.create(&op, input("Grünstrom")).await.unwrap();
        assert!(matches!(
            svc.create(&op, input("Grünstrom")).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn only_operators_create() {
        let repos = Arc::new(InMemoryStorage::new());
        let hh = user(&repos, "hh@example.de", UserRole::Household).await;
        let svc = TariffService::new(repos.clone());
        assert!(matches!(
            svc.create(&hh, input("X")).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn foreign_operator_is_forbidden() {
        let repos = Arc::new(InMemoryStorage::new());
        let op = user(&repos, "netz@example.de", UserRole::GridOperator).await;
        let other = user(&repos, "netz2@example.de", UserRole::GridOperator).await;
        let svc = TariffService::new(repos.clone());
        let t = svc.create(&op, input("Basis")).await.unwrap();
        assert!(matches!(
            svc.delete(&other, t.id).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn referenced_tariff_is_locked_until_cancelled() {
        let repos = Arc::new(InMemoryStorage::new());
        let op = user(&repos, "netz@example.de", UserRole::GridOperator).await;
        let hh = user(&repos, "hh@example.de", UserRole::Household).await;
        let svc = TariffService::new(repos.clone());
        let t = svc.create(&op, input("Basis")).await.unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let contract = repos
            .contracts()
            .create(Contract::new(hh.id, &t, start, 3500).unwrap())
            .await
            .unwrap();

        assert!(matches!(
            svc.update(&op, t.id, input("Basis neu")).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            svc.delete(&op, t.id).await,
            Err(DomainError::Conflict(_))
        ));

        let pending = repos
            .contracts()
            .open_cancellation(CancellationRequest::new(contract.id, hh.id, None))
            .await
            .unwrap();
        repos
            .contracts()
            .settle_cancellation(CancellationSettlement {
                contract_id: contract.id,
                cancellation_id: pending.id,
                invoice: Invoice::new(
                    op.id,
                    hh.id,
                    InvoiceCategory::GridOperatorInvoice,
                    1,
                    start,
                    30,
                )
                .for_contract(contract.id),
                replacement: None,
            })
            .await
            .unwrap();

        let updated = svc.update(&op, t.id, input("Basis neu")).await.unwrap();
        assert_eq!(updated.name, "Basis neu");
        svc.delete(&op, t.id).await.unwrap();
        assert!(matches!(svc.get(t.id).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn deactivated_tariffs_drop_out_of_active_list() {
        let repos = Arc::new(InMemoryStorage::new());
        let op = user(&repos, "netz@example.de", UserRole::GridOperator).await;
        let svc = TariffService::new(repos.clone());
        let a = svc.create(&op, input("A")).await.unwrap();
        svc.create(&op, input("B")).await.unwrap();
        svc.set_active(&op, a.id, false).await.unwrap();

        let names: Vec<String> = svc.list_active().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["B".to_string()]);
        assert_eq!(svc.list_own(&op).await.unwrap().len(), 2);
    }
}
