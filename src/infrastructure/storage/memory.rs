//! In-memory implementation of every repository

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::certificate::CertificateRepository;
use crate::domain::contract::{
    CancellationSettlement, ContractRepository, SettledCancellation,
};
use crate::domain::installation::InstallationRepository;
use crate::domain::invoice::{InvoiceRepository, PeriodKey};
use crate::domain::tariff::TariffRepository;
use crate::domain::user::{NewUser, UserRepository};
use crate::domain::{
    Address, CancellationRequest, CertificateStatus, Contract, ContractStatus, DomainError,
    DomainResult, EfficiencyMeasure, EnergyCertificate, InstallationRequest, Invoice, Offer,
    PaymentStatus, ProcessStatus, RepositoryProvider, Tariff, User, UserRole,
};

/// Id sequence starting at 1, like an autoincrement column.
struct Sequence(AtomicI32);

impl Sequence {
    fn new() -> Self {
        Self(AtomicI32::new(1))
    }

    fn next(&self) -> i32 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

fn sorted<T: Clone>(map: &DashMap<i32, T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    let mut rows: Vec<(i32, T)> = map
        .iter()
        .filter(|e| keep(e.value()))
        .map(|e| (*e.key(), e.value().clone()))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, v)| v).collect()
}

/// In-memory storage for development and testing
pub struct InMemoryStorage {
    users: DashMap<i32, User>,
    addresses: DashMap<i32, Address>,
    requests: DashMap<i32, InstallationRequest>,
    offers: DashMap<i32, Offer>,
    tariffs: DashMap<i32, Tariff>,
    contracts: DashMap<i32, Contract>,
    cancellations: DashMap<i32, CancellationRequest>,
    invoices: DashMap<i32, Invoice>,
    certificates: DashMap<i32, EnergyCertificate>,
    measures: DashMap<i32, EfficiencyMeasure>,
    user_seq: Sequence,
    address_seq: Sequence,
    request_seq: Sequence,
    offer_seq: Sequence,
    tariff_seq: Sequence,
    contract_seq: Sequence,
    cancellation_seq: Sequence,
    invoice_seq: Sequence,
    certificate_seq: Sequence,
    measure_seq: Sequence,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            addresses: DashMap::new(),
            requests: DashMap::new(),
            offers: DashMap::new(),
            tariffs: DashMap::new(),
            contracts: DashMap::new(),
            cancellations: DashMap::new(),
            invoices: DashMap::new(),
            certificates: DashMap::new(),
            measures: DashMap::new(),
            user_seq: Sequence::new(),
            address_seq: Sequence::new(),
            request_seq: Sequence::new(),
            offer_seq: Sequence::new(),
            tariff_seq: Sequence::new(),
            contract_seq: Sequence::new(),
            cancellation_seq: Sequence::new(),
            invoice_seq: Sequence::new(),
            certificate_seq: Sequence::new(),
            measure_seq: Sequence::new(),
        }
    }

    fn insert_contract(&self, mut contract: Contract) -> Contract {
        contract.id = self.contract_seq.next();
        self.contracts.insert(contract.id, contract.clone());
        contract
    }

    fn insert_invoice(&self, mut invoice: Invoice) -> DomainResult<Invoice> {
        if let (Some(contract_id), Some(start), Some(end)) =
            (invoice.contract_id, invoice.period_start, invoice.period_end)
        {
            let duplicate = self.invoices.iter().any(|e| {
                let i = e.value();
                i.contract_id == Some(contract_id)
                    && i.period_start == Some(start)
                    && i.period_end == Some(end)
                    && i.category == invoice.category
            });
            if duplicate {
                return Err(DomainError::Conflict(format!(
                    "invoice for contract {} period {}..{} already exists",
                    contract_id, start, end
                )));
            }
        }
        invoice.id = self.invoice_seq.next();
        self.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryStorage {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn installations(&self) -> &dyn InstallationRepository {
        self
    }

    fn tariffs(&self) -> &dyn TariffRepository {
        self
    }

    fn contracts(&self) -> &dyn ContractRepository {
        self
    }

    fn invoices(&self) -> &dyn InvoiceRepository {
        self
    }

    fn certificates(&self) -> &dyn CertificateRepository {
        self
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}

// ── Users ───────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for InMemoryStorage {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let email = user.email.to_lowercase();
        if self.users.iter().any(|e| e.value().email == email) {
            return Err(DomainError::Conflict(format!("email {} already registered", email)));
        }
        let now = Utc::now();
        let user = User {
            id: self.user_seq.next(),
            name: user.name,
            email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            address_id: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|e| e.value().email == email)
            .map(|e| e.value().clone()))
    }

    async fn list(&self, role: Option<UserRole>) -> DomainResult<Vec<User>> {
        Ok(sorted(&self.users, |u| role.map_or(true, |r| u.role == r)))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn update_role(&self, id: i32, role: UserRole) -> DomainResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_active(&self, id: i32, active: bool) -> DomainResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> DomainResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_last_login(&self, id: i32) -> DomainResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_address(&self, id: i32, address_id: i32) -> DomainResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.address_id = Some(address_id);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn save_address(&self, mut address: Address) -> DomainResult<Address> {
        address.id = self.address_seq.next();
        self.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn find_address(&self, id: i32) -> DomainResult<Option<Address>> {
        Ok(self.addresses.get(&id).map(|a| a.clone()))
    }
}

// ── Installation requests ───────────────────────────────────────

#[async_trait]
impl InstallationRepository for InMemoryStorage {
    async fn create(&self, mut request: InstallationRequest) -> DomainResult<InstallationRequest> {
        request.id = self.request_seq.next();
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<InstallationRequest>> {
        Ok(self.requests.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, request: &InstallationRequest) -> DomainResult<()> {
        let mut stored = self
            .requests
            .get_mut(&request.id)
            .ok_or_else(|| DomainError::not_found("InstallationRequest", request.id))?;
        *stored = request.clone();
        Ok(())
    }

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<InstallationRequest>> {
        Ok(sorted(&self.requests, |r| r.household_id == household_id))
    }

    async fn list_by_installer(&self, installer_id: i32) -> DomainResult<Vec<InstallationRequest>> {
        Ok(sorted(&self.requests, |r| r.installer_id == Some(installer_id)))
    }

    async fn list_by_status(&self, statuses: &[ProcessStatus]) -> DomainResult<Vec<InstallationRequest>> {
        Ok(sorted(&self.requests, |r| statuses.contains(&r.status)))
    }

    async fn list_by_certificate(&self, certificate_id: i32) -> DomainResult<Vec<InstallationRequest>> {
        Ok(sorted(&self.requests, |r| r.certificate_id == Some(certificate_id)))
    }

    async fn save_offer(&self, mut offer: Offer) -> DomainResult<Offer> {
        if self.offers.iter().any(|e| e.value().request_id == offer.request_id) {
            return Err(DomainError::Conflict(format!(
                "offer for request {} already exists",
                offer.request_id
            )));
        }
        offer.id = self.offer_seq.next();
        self.offers.insert(offer.id, offer.clone());
        Ok(offer)
    }

    async fn find_offer(&self, request_id: i32) -> DomainResult<Option<Offer>> {
        Ok(self
            .offers
            .iter()
            .find(|e| e.value().request_id == request_id)
            .map(|e| e.value().clone()))
    }
}

// ── Tariffs ─────────────────────────────────────────────────────

#[async_trait]
impl TariffRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>> {
        Ok(self.tariffs.get(&id).map(|t| t.clone()))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Tariff>> {
        Ok(self
            .tariffs
            .iter()
            .find(|e| e.value().name == name)
            .map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Tariff>> {
        Ok(sorted(&self.tariffs, |_| true))
    }

    async fn find_active(&self) -> DomainResult<Vec<Tariff>> {
        Ok(sorted(&self.tariffs, |t| t.is_active))
    }

    async fn find_by_operator(&self, operator_id: i32) -> DomainResult<Vec<Tariff>> {
        Ok(sorted(&self.tariffs, |t| t.operator_id == operator_id))
    }

    async fn save(&self, mut tariff: Tariff) -> DomainResult<Tariff> {
        if self.tariffs.iter().any(|e| e.value().name == tariff.name) {
            return Err(DomainError::Conflict(format!(
                "tariff name '{}' already exists",
                tariff.name
            )));
        }
        tariff.id = self.tariff_seq.next();
        self.tariffs.insert(tariff.id, tariff.clone());
        Ok(tariff)
    }

    async fn update(&self, tariff: &Tariff) -> DomainResult<()> {
        let mut stored = self
            .tariffs
            .get_mut(&tariff.id)
            .ok_or_else(|| DomainError::not_found("Tariff", tariff.id))?;
        *stored = tariff.clone();
        Ok(())
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        self.tariffs
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Tariff", id))?;
        Ok(())
    }
}

// ── Contracts ───────────────────────────────────────────────────

#[async_trait]
impl ContractRepository for InMemoryStorage {
    async fn create(&self, contract: Contract) -> DomainResult<Contract> {
        Ok(self.insert_contract(contract))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Contract>> {
        Ok(self.contracts.get(&id).map(|c| c.clone()))
    }

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<Contract>> {
        Ok(sorted(&self.contracts, |c| c.household_id == household_id))
    }

    async fn list_by_operator(&self, operator_id: i32) -> DomainResult<Vec<Contract>> {
        Ok(sorted(&self.contracts, |c| c.operator_id == operator_id))
    }

    async fn list_open(&self) -> DomainResult<Vec<Contract>> {
        Ok(sorted(&self.contracts, Contract::is_open))
    }

    async fn exists_open_for_tariff(&self, tariff_id: i32) -> DomainResult<bool> {
        Ok(self
            .contracts
            .iter()
            .any(|e| e.value().tariff_id == tariff_id && e.value().is_open()))
    }

    async fn exists_open_for(&self, household_id: i32, tariff_id: i32) -> DomainResult<bool> {
        Ok(self.contracts.iter().any(|e| {
            let c = e.value();
            c.household_id == household_id && c.tariff_id == tariff_id && c.is_open()
        }))
    }

    async fn open_cancellation(
        &self,
        mut request: CancellationRequest,
    ) -> DomainResult<CancellationRequest> {
        let mut contract = self
            .contracts
            .get_mut(&request.contract_id)
            .ok_or_else(|| DomainError::not_found("Contract", request.contract_id))?;
        contract.status = ContractStatus::CancellationPending;
        contract.updated_at = Utc::now();
        drop(contract);

        request.id = self.cancellation_seq.next();
        self.cancellations.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_pending_cancellation(
        &self,
        contract_id: i32,
    ) -> DomainResult<Option<CancellationRequest>> {
        Ok(sorted(&self.cancellations, |c| {
            c.contract_id == contract_id && c.confirmed.is_none()
        })
        .pop())
    }

    async fn list_pending_cancellations(
        &self,
        operator_id: i32,
    ) -> DomainResult<Vec<CancellationRequest>> {
        Ok(sorted(&self.cancellations, |c| {
            c.confirmed.is_none()
                && self
                    .contracts
                    .get(&c.contract_id)
                    .map_or(false, |contract| contract.operator_id == operator_id)
        }))
    }

    async fn settle_cancellation(
        &self,
        settlement: CancellationSettlement,
    ) -> DomainResult<SettledCancellation> {
        {
            let mut contract = self
                .contracts
                .get_mut(&settlement.contract_id)
                .ok_or_else(|| DomainError::not_found("Contract", settlement.contract_id))?;
            contract.status = ContractStatus::Cancelled;
            contract.updated_at = Utc::now();
        }
        if let Some(mut request) = self.cancellations.get_mut(&settlement.cancellation_id) {
            request.confirmed = Some(true);
            request.resolved_at = Some(Utc::now());
        }
        let invoice = self.insert_invoice(settlement.invoice)?;
        let replacement = settlement.replacement.map(|c| self.insert_contract(c));
        Ok(SettledCancellation {
            invoice,
            replacement,
        })
    }

    async fn reject_cancellation(&self, contract_id: i32, cancellation_id: i32) -> DomainResult<()> {
        {
            let mut contract = self
                .contracts
                .get_mut(&contract_id)
                .ok_or_else(|| DomainError::not_found("Contract", contract_id))?;
            contract.status = ContractStatus::Running;
            contract.updated_at = Utc::now();
        }
        if let Some(mut request) = self.cancellations.get_mut(&cancellation_id) {
            request.confirmed = Some(false);
            request.resolved_at = Some(Utc::now());
        }
        Ok(())
    }
}

// ── Invoices ────────────────────────────────────────────────────

#[async_trait]
impl InvoiceRepository for InMemoryStorage {
    async fn create(&self, invoice: Invoice) -> DomainResult<Invoice> {
        self.insert_invoice(invoice)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Invoice>> {
        Ok(self.invoices.get(&id).map(|i| i.clone()))
    }

    async fn list_for_party(&self, user_id: i32) -> DomainResult<Vec<Invoice>> {
        let mut rows = sorted(&self.invoices, |i| i.is_party(user_id));
        rows.reverse();
        Ok(rows)
    }

    async fn list_all(&self) -> DomainResult<Vec<Invoice>> {
        let mut rows = sorted(&self.invoices, |_| true);
        rows.reverse();
        Ok(rows)
    }

    async fn exists_for_period(&self, key: PeriodKey) -> DomainResult<bool> {
        Ok(self.invoices.iter().any(|e| {
            let i = e.value();
            i.issuer_id == key.issuer_id
                && i.contract_id == Some(key.contract_id)
                && i.period_start == Some(key.period_start)
                && i.period_end == Some(key.period_end)
                && i.category == key.category
        }))
    }

    async fn mark_paid(&self, id: i32) -> DomainResult<()> {
        let mut invoice = self
            .invoices
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Invoice", id))?;
        invoice.payment_status = PaymentStatus::Paid;
        Ok(())
    }
}

// ── Certificates ────────────────────────────────────────────────

#[async_trait]
impl CertificateRepository for InMemoryStorage {
    async fn create(&self, mut certificate: EnergyCertificate) -> DomainResult<EnergyCertificate> {
        certificate.id = self.certificate_seq.next();
        self.certificates.insert(certificate.id, certificate.clone());
        Ok(certificate)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<EnergyCertificate>> {
        Ok(self.certificates.get(&id).map(|c| c.clone()))
    }

    async fn update(&self, certificate: &EnergyCertificate) -> DomainResult<()> {
        let mut stored = self
            .certificates
            .get_mut(&certificate.id)
            .ok_or_else(|| DomainError::not_found("EnergyCertificate", certificate.id))?;
        *stored = certificate.clone();
        Ok(())
    }

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<EnergyCertificate>> {
        Ok(sorted(&self.certificates, |c| c.household_id == household_id))
    }

    async fn list_by_status(
        &self,
        statuses: &[CertificateStatus],
    ) -> DomainResult<Vec<EnergyCertificate>> {
        Ok(sorted(&self.certificates, |c| statuses.contains(&c.status)))
    }

    async fn save_measure(&self, mut measure: EfficiencyMeasure) -> DomainResult<EfficiencyMeasure> {
        measure.id = self.measure_seq.next();
        self.measures.insert(measure.id, measure.clone());
        Ok(measure)
    }

    async fn find_measure(&self, id: i32) -> DomainResult<Option<EfficiencyMeasure>> {
        Ok(self.measures.get(&id).map(|m| m.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::InvoiceCategory;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "x".into(),
            role: UserRole::Household,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStorage::new();
        store.users().create(new_user("a@b.de")).await.unwrap();
        let err = store.users().create(new_user("A@B.de")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let store = InMemoryStorage::new();
        let a = store.users().create(new_user("a@b.de")).await.unwrap();
        let b = store.users().create(new_user("b@b.de")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn second_period_invoice_conflicts() {
        let store = InMemoryStorage::new();
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let invoice = Invoice::new(3, 1, InvoiceCategory::GridOperatorInvoice, 100, day, 30)
            .for_contract(9)
            .with_period(day, end);

        store.invoices().create(invoice.clone()).await.unwrap();
        assert!(matches!(
            store.invoices().create(invoice).await,
            Err(DomainError::Conflict(_))
        ));
    }
}
