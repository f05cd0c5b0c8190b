//! Energy certificate workflow
//!
//! Requesting and issuing a certificate fans out to every PV request of
//! the household, not just one.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::application::identity::require_role;
use crate::application::ports::{notify_user, Notifier};
use crate::domain::{
    CertificateStatus, DomainError, DomainResult, EfficiencyMeasure, EnergyCertificate, Invoice,
    InvoiceCategory, ProcessStatus, RepositoryProvider, User, UserRole,
};

/// Consultant input for the additional-data step
#[derive(Debug, Clone)]
pub struct MeasureInput {
    pub description: String,
    pub estimated_savings_kwh: f64,
}

/// Issued certificate plus the invoice it triggered
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: EnergyCertificate,
    pub invoice: Invoice,
    pub updated_requests: usize,
}

pub struct CertificateService {
    repos: Arc<dyn RepositoryProvider>,
    notifier: Arc<dyn Notifier>,
    fee_cents: i64,
    invoice_due_days: u32,
}

impl CertificateService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifier: Arc<dyn Notifier>,
        fee_cents: i64,
        invoice_due_days: u32,
    ) -> Self {
        Self {
            repos,
            notifier,
            fee_cents,
            invoice_due_days,
        }
    }

    async fn load(&self, id: i32) -> DomainResult<EnergyCertificate> {
        self.repos
            .certificates()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("EnergyCertificate", id))
    }

    /// Needs at least one PV request of the household. Every request that
    /// is not finished moves to `AusweisRequested`.
    pub async fn request(&self, actor: &User) -> DomainResult<EnergyCertificate> {
        require_role(actor, &[UserRole::Household])?;
        let requests = self
            .repos
            .installations()
            .list_by_household(actor.id)
            .await?;
        if requests.is_empty() {
            return Err(DomainError::Precondition(
                "Für einen Energieausweis ist eine PV-Anfrage erforderlich".into(),
            ));
        }

        let certificate = self
            .repos
            .certificates()
            .create(EnergyCertificate::new(actor.id))
            .await?;

        let mut moved = 0;
        for mut request in requests {
            if request.mark_certificate_requested(certificate.id) {
                self.repos.installations().update(&request).await?;
                moved += 1;
            }
        }

        info!(
            certificate_id = certificate.id,
            household_id = actor.id,
            requests = moved,
            "Energy certificate requested"
        );
        Ok(certificate)
    }

    pub async fn enter_additional_data(
        &self,
        actor: &User,
        id: i32,
        input: MeasureInput,
    ) -> DomainResult<EnergyCertificate> {
        require_role(actor, &[UserRole::EnergyConsultant])?;
        let mut certificate = self.load(id).await?;
        certificate.ensure_accepts_additional_data(actor.id)?;
        if input.description.trim().is_empty() {
            return Err(DomainError::BadRequest("description must not be empty".into()));
        }

        let measure = self
            .repos
            .certificates()
            .save_measure(EfficiencyMeasure {
                id: 0,
                certificate_id: id,
                description: input.description,
                estimated_savings_kwh: input.estimated_savings_kwh,
            })
            .await?;
        certificate.enter_additional_data(actor.id, measure.id)?;
        self.repos.certificates().update(&certificate).await?;

        info!(certificate_id = id, measure_id = measure.id, "Additional certificate data entered");
        Ok(certificate)
    }

    /// Issues the certificate, moves every waiting request of the household
    /// to `AusweisIssued` and bills the household.
    pub async fn issue(
        &self,
        actor: &User,
        id: i32,
        today: NaiveDate,
    ) -> DomainResult<IssuedCertificate> {
        require_role(actor, &[UserRole::EnergyConsultant])?;
        let mut certificate = self.load(id).await?;

        let waiting: Vec<_> = self
            .repos
            .installations()
            .list_by_household(certificate.household_id)
            .await?
            .into_iter()
            .filter(|r| r.status == ProcessStatus::AusweisRequested)
            .collect();

        certificate.issue(actor.id, today, self.fee_cents, !waiting.is_empty())?;
        self.repos.certificates().update(&certificate).await?;

        let mut updated_requests = 0;
        for mut request in waiting {
            if request.mark_certificate_issued(certificate.id) {
                self.repos.installations().update(&request).await?;
                updated_requests += 1;
            }
        }

        let invoice = self
            .repos
            .invoices()
            .create(
                Invoice::new(
                    actor.id,
                    certificate.household_id,
                    InvoiceCategory::ConsultantInvoice,
                    self.fee_cents,
                    today,
                    self.invoice_due_days,
                )
                .for_certificate(certificate.id),
            )
            .await?;
        metrics::counter!("invoices_created_total", "category" => "consultant").increment(1);

        info!(
            certificate_id = id,
            consultant_id = actor.id,
            invoice_id = invoice.id,
            updated_requests,
            "Energy certificate issued"
        );
        notify_user(
            self.repos.as_ref(),
            self.notifier.as_ref(),
            certificate.household_id,
            "Energieausweis ausgestellt",
            &format!(
                "Ihr Energieausweis {} ist gültig bis {}.",
                certificate.id,
                certificate
                    .valid_until
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            ),
        )
        .await;

        Ok(IssuedCertificate {
            certificate,
            invoice,
            updated_requests,
        })
    }

    pub async fn get(&self, actor: &User, id: i32) -> DomainResult<EnergyCertificate> {
        let certificate = self.load(id).await?;
        let allowed = match actor.role {
            UserRole::Household => certificate.household_id == actor.id,
            UserRole::EnergyConsultant | UserRole::Admin => true,
            _ => false,
        };
        if !allowed {
            return Err(DomainError::Forbidden(format!(
                "Kein Zugriff auf Energieausweis {}",
                id
            )));
        }
        Ok(certificate)
    }

    pub async fn get_measure(&self, actor: &User, id: i32) -> DomainResult<Option<EfficiencyMeasure>> {
        let certificate = self.get(actor, id).await?;
        match certificate.measure_id {
            Some(measure_id) => self.repos.certificates().find_measure(measure_id).await,
            None => Ok(None),
        }
    }

    /// Household: own certificates. Consultant: open requests. Admin: all.
    pub async fn list(&self, actor: &User) -> DomainResult<Vec<EnergyCertificate>> {
        let repo = self.repos.certificates();
        match actor.role {
            UserRole::Household => repo.list_by_household(actor.id).await,
            UserRole::EnergyConsultant => {
                repo.list_by_status(&[
                    CertificateStatus::Requested,
                    CertificateStatus::AdditionalDataEntered,
                ])
                .await
            }
            UserRole::Admin => {
                repo.list_by_status(&[
                    CertificateStatus::Requested,
                    CertificateStatus::AdditionalDataEntered,
                    CertificateStatus::Issued,
                ])
                .await
            }
            _ => Err(DomainError::Forbidden(format!(
                "Rolle {} hat keinen Zugriff auf Energieausweise",
                actor.role
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;
    use crate::domain::InstallationRequest;
    use crate::infrastructure::notifications::LogNotifier;
    use crate::infrastructure::storage::InMemoryStorage;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
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

    async fn setup() -> (Arc<InMemoryStorage>, CertificateService, User, User) {
        let repos = Arc::new(InMemoryStorage::new());
        let household = user(&repos, "hh@example.de", UserRole::Household).await;
        let consultant = user(&repos, "berater@example.de", UserRole::EnergyConsultant).await;
        let svc = CertificateService::new(repos.clone(), Arc::new(LogNotifier), 25_000, 30);
        (repos, svc, household, consultant)
    }

    async fn pv_request(repos: &InMemoryStorage, household: &User) -> InstallationRequest {
        repos
            .installations()
            .create(InstallationRequest::new(household.id, None))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn request_needs_a_pv_request() {
        let (_, svc, household, _) = setup().await;
        assert!(matches!(
            svc.request(&household).await,
            Err(DomainError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn issuing_fans_out_to_all_waiting_requests() {
        let (repos, svc, household, consultant) = setup().await;
        let a = pv_request(&repos, &household).await;
        let b = pv_request(&repos, &household).await;

        let cert = svc.request(&household).await.unwrap();
        for id in [a.id, b.id] {
            let r = repos.installations().find_by_id(id).await.unwrap().unwrap();
            assert_eq!(r.status, ProcessStatus::AusweisRequested);
        }

        let issued = svc.issue(&consultant, cert.id, today()).await.unwrap();
        assert_eq!(issued.updated_requests, 2);
        assert_eq!(issued.certificate.status, CertificateStatus::Issued);
        assert_eq!(issued.certificate.valid_until, NaiveDate::from_ymd_opt(2035, 9, 1));
        for id in [a.id, b.id] {
            let r = repos.installations().find_by_id(id).await.unwrap().unwrap();
            assert_eq!(r.status, ProcessStatus::AusweisIssued);
            assert_eq!(r.certificate_id, Some(cert.id));
        }

        assert_eq!(issued.invoice.category, InvoiceCategory::ConsultantInvoice);
        assert_eq!(issued.invoice.issuer_id, consultant.id);
        assert_eq!(issued.invoice.recipient_id, household.id);
        assert_eq!(issued.invoice.amount_cents, 25_000);
    }

    #[tokio::test]
    async fn terminal_requests_are_left_alone() {
        let (repos, svc, household, _) = setup().await;
        let mut rejected = pv_request(&repos, &household).await;
        rejected.status = ProcessStatus::OfferRejected;
        repos.installations().update(&rejected).await.unwrap();
        let open = pv_request(&repos, &household).await;

        svc.request(&household).await.unwrap();
        let r = repos.installations().find_by_id(rejected.id).await.unwrap().unwrap();
        assert_eq!(r.status, ProcessStatus::OfferRejected);
        let r = repos.installations().find_by_id(open.id).await.unwrap().unwrap();
        assert_eq!(r.status, ProcessStatus::AusweisRequested);
    }

    #[tokio::test]
    async fn additional_data_step() {
        let (repos, svc, household, consultant) = setup().await;
        pv_request(&repos, &household).await;
        let cert = svc.request(&household).await.unwrap();

        let updated = svc
            .enter_additional_data(
                &consultant,
                cert.id,
                MeasureInput {
                    description: "Dachdämmung".into(),
                    estimated_savings_kwh: 1200.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, CertificateStatus::AdditionalDataEntered);

        let measure = svc.get_measure(&household, cert.id).await.unwrap().unwrap();
        assert_eq!(measure.description, "Dachdämmung");
        assert!(svc.list(&consultant).await.unwrap().iter().any(|c| c.id == cert.id));
    }

    #[tokio::test]
    async fn issued_certificate_cannot_be_reissued_without_waiting_request() {
        let (repos, svc, household, consultant) = setup().await;
        pv_request(&repos, &household).await;
        let cert = svc.request(&household).await.unwrap();
        svc.issue(&consultant, cert.id, today()).await.unwrap();
        assert!(matches!(
            svc.issue(&consultant, cert.id, today()).await,
            Err(DomainError::PreconditionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn other_household_cannot_read() {
        let (repos, svc, household, _) = setup().await;
        let other = user(&repos, "nachbar@example.de", UserRole::Household).await;
        pv_request(&repos, &household).await;
        let cert = svc.request(&household).await.unwrap();
        assert!(matches!(
            svc.get(&other, cert.id).await,
            Err(DomainError::Forbidden(_))
        ));
    }
}
