//! Installation workflow service
//!
//! Every operation runs the role check first, then loads the request and
//! lets the aggregate check its status. Only a successful transition is
//! persisted.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::identity::require_role;
use crate::application::ports::{notify_user, Notifier};
use crate::domain::installation::{OfferDetails, PlanDetails};
use crate::domain::{
    check_grid_compatibility, DomainError, DomainResult, InstallationRequest, Invoice,
    InvoiceCategory, Offer, ProcessStatus, RepositoryProvider, User, UserRole,
};

/// Statuses a grid operator works on.
const OPERATOR_VISIBLE: [ProcessStatus; 6] = [
    ProcessStatus::PlanCreated,
    ProcessStatus::Approved,
    ProcessStatus::FeedInGranted,
    ProcessStatus::AusweisRequested,
    ProcessStatus::AusweisIssued,
    ProcessStatus::Accepted,
];

pub struct InstallationService {
    repos: Arc<dyn RepositoryProvider>,
    notifier: Arc<dyn Notifier>,
    invoice_due_days: u32,
}

impl InstallationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifier: Arc<dyn Notifier>,
        invoice_due_days: u32,
    ) -> Self {
        Self {
            repos,
            notifier,
            invoice_due_days,
        }
    }

    async fn load(&self, id: i32) -> DomainResult<InstallationRequest> {
        self.repos
            .installations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("InstallationRequest", id))
    }

    async fn notify(&self, user_id: i32, subject: &str, body: &str) {
        notify_user(
            self.repos.as_ref(),
            self.notifier.as_ref(),
            user_id,
            subject,
            body,
        )
        .await;
    }

    // ── Household ───────────────────────────────────────────────

    pub async fn create_request(
        &self,
        actor: &User,
        notes: Option<String>,
    ) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Household])?;
        let request = self
            .repos
            .installations()
            .create(InstallationRequest::new(actor.id, notes))
            .await?;
        info!(request_id = request.id, household_id = actor.id, "Installation requested");
        Ok(request)
    }

    /// Accepting bills the household for the offered amount.
    pub async fn accept_offer(&self, actor: &User, id: i32) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Household])?;
        let mut request = self.load(id).await?;
        request.accept_offer(actor.id)?;
        self.repos.installations().update(&request).await?;

        let offer = self
            .repos
            .installations()
            .find_offer(id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("request {} has no offer row", id)))?;
        let invoice = self
            .repos
            .invoices()
            .create(
                Invoice::new(
                    offer.installer_id,
                    request.household_id,
                    InvoiceCategory::InstallerInvoice,
                    offer.cost_cents,
                    Utc::now().date_naive(),
                    self.invoice_due_days,
                )
                .for_request(id),
            )
            .await?;
        metrics::counter!("invoices_created_total", "category" => "installer").increment(1);

        info!(request_id = id, invoice_id = invoice.id, "Offer accepted");
        self.notify(
            offer.installer_id,
            "Angebot angenommen",
            &format!("Ihr Angebot für Anfrage {} wurde angenommen.", id),
        )
        .await;
        Ok(request)
    }

    pub async fn reject_offer(&self, actor: &User, id: i32) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Household])?;
        let mut request = self.load(id).await?;
        request.reject_offer(actor.id)?;
        self.repos.installations().update(&request).await?;

        info!(request_id = id, "Offer rejected");
        if let Some(installer_id) = request.installer_id {
            self.notify(
                installer_id,
                "Angebot abgelehnt",
                &format!("Ihr Angebot für Anfrage {} wurde abgelehnt.", id),
            )
            .await;
        }
        Ok(request)
    }

    pub async fn release_data(&self, actor: &User, id: i32) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Household])?;
        let mut request = self.load(id).await?;
        request.release_data(actor.id)?;
        self.repos.installations().update(&request).await?;
        info!(request_id = id, "Data released to installer");
        Ok(request)
    }

    // ── Installer ───────────────────────────────────────────────

    pub async fn make_offer(
        &self,
        actor: &User,
        id: i32,
        details: OfferDetails,
    ) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Installer])?;
        let mut request = self.load(id).await?;
        request.make_offer(actor.id, &details)?;

        self.repos
            .installations()
            .save_offer(Offer {
                id: 0,
                request_id: id,
                installer_id: actor.id,
                cost_cents: details.cost_cents,
                created_at: Utc::now(),
            })
            .await?;
        self.repos.installations().update(&request).await?;

        info!(request_id = id, installer_id = actor.id, cost_cents = details.cost_cents, "Offer made");
        self.notify(
            request.household_id,
            "Neues Angebot",
            &format!("Für Ihre Anfrage {} liegt ein Angebot vor.", id),
        )
        .await;
        Ok(request)
    }

    pub async fn request_data(&self, actor: &User, id: i32) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Installer])?;
        let mut request = self.load(id).await?;
        request.request_data(actor.id)?;
        self.repos.installations().update(&request).await?;
        info!(request_id = id, "Installer requested household data");
        Ok(request)
    }

    pub async fn submit_plan(
        &self,
        actor: &User,
        id: i32,
        plan: PlanDetails,
    ) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::Installer])?;
        let mut request = self.load(id).await?;
        request.submit_plan(actor.id, &plan)?;
        self.repos.installations().update(&request).await?;
        info!(request_id = id, capacity_kw = plan.capacity_kw, "Installation plan submitted");
        Ok(request)
    }

    // ── Grid operator ───────────────────────────────────────────

    /// Runs the compatibility check and stores the verdict. The status
    /// stays `PlanCreated` either way.
    pub async fn check_compatibility(
        &self,
        actor: &User,
        id: i32,
    ) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::GridOperator])?;
        let mut request = self.load(id).await?;
        if request.status != ProcessStatus::PlanCreated {
            return Err(DomainError::wrong_status(
                &request.status,
                &[ProcessStatus::PlanCreated],
            ));
        }
        let compatible = check_grid_compatibility(&request.grid_inputs())?;
        request.record_compatibility(compatible)?;
        self.repos.installations().update(&request).await?;
        info!(request_id = id, compatible, "Grid compatibility checked");
        Ok(request)
    }

    pub async fn grant_feed_in(&self, actor: &User, id: i32) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::GridOperator])?;
        let mut request = self.load(id).await?;
        request.grant_feed_in(actor.id)?;
        self.repos.installations().update(&request).await?;

        info!(request_id = id, operator_id = actor.id, "Feed-in granted");
        self.notify(
            request.household_id,
            "Einspeisung genehmigt",
            &format!("Die Einspeisung für Anfrage {} wurde genehmigt.", id),
        )
        .await;
        Ok(request)
    }

    pub async fn confirm_acceptance(
        &self,
        actor: &User,
        id: i32,
    ) -> DomainResult<InstallationRequest> {
        require_role(actor, &[UserRole::GridOperator, UserRole::EnergyConsultant])?;
        let mut request = self.load(id).await?;
        request.confirm_acceptance()?;
        self.repos.installations().update(&request).await?;
        info!(request_id = id, actor_id = actor.id, "Installation accepted");
        Ok(request)
    }

    // ── Reads ───────────────────────────────────────────────────

    pub async fn get(&self, actor: &User, id: i32) -> DomainResult<InstallationRequest> {
        let request = self.load(id).await?;
        let allowed = match actor.role {
            UserRole::Admin | UserRole::GridOperator | UserRole::EnergyConsultant => true,
            UserRole::Installer => {
                request.installer_id.is_none() || request.installer_id == Some(actor.id)
            }
            UserRole::Household => request.household_id == actor.id,
        };
        if !allowed {
            return Err(DomainError::Forbidden(format!(
                "Kein Zugriff auf Anfrage {}",
                id
            )));
        }
        Ok(request)
    }

    pub async fn get_offer(&self, actor: &User, id: i32) -> DomainResult<Offer> {
        self.get(actor, id).await?;
        self.repos
            .installations()
            .find_offer(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Offer",
                field: "request_id",
                value: id.to_string(),
            })
    }

    /// Requests visible to the caller's role; empty when nothing matches.
    pub async fn list(&self, actor: &User) -> DomainResult<Vec<InstallationRequest>> {
        let repo = self.repos.installations();
        match actor.role {
            UserRole::Household => repo.list_by_household(actor.id).await,
            UserRole::Installer => {
                let mut rows: Vec<_> = repo
                    .list_by_status(&[ProcessStatus::Requested])
                    .await?
                    .into_iter()
                    .filter(|r| r.installer_id.is_none())
                    .collect();
                rows.extend(repo.list_by_installer(actor.id).await?);
                rows.sort_by_key(|r| r.id);
                rows.dedup_by_key(|r| r.id);
                Ok(rows)
            }
            UserRole::GridOperator => repo.list_by_status(&OPERATOR_VISIBLE).await,
            UserRole::EnergyConsultant => {
                repo.list_by_status(&[ProcessStatus::AusweisRequested]).await
            }
            UserRole::Admin => repo.list_by_status(&ProcessStatus::ALL).await,
        }
    }
}
