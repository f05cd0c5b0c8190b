use async_trait::async_trait;

use super::model::{InstallationRequest, Offer, ProcessStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait InstallationRepository: Send + Sync {
    /// Inserts a new request; `request.id` is ignored.
    async fn create(&self, request: InstallationRequest) -> DomainResult<InstallationRequest>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<InstallationRequest>>;
    /// Overwrites every mutable column of an existing request.
    async fn update(&self, request: &InstallationRequest) -> DomainResult<()>;

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<InstallationRequest>>;
    async fn list_by_installer(&self, installer_id: i32) -> DomainResult<Vec<InstallationRequest>>;
    async fn list_by_status(&self, statuses: &[ProcessStatus]) -> DomainResult<Vec<InstallationRequest>>;
    async fn list_by_certificate(&self, certificate_id: i32) -> DomainResult<Vec<InstallationRequest>>;

    async fn save_offer(&self, offer: Offer) -> DomainResult<Offer>;
    async fn find_offer(&self, request_id: i32) -> DomainResult<Option<Offer>>;
}
