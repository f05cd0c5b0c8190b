use async_trait::async_trait;

use super::model::{CertificateStatus, EfficiencyMeasure, EnergyCertificate};
use crate::domain::DomainResult;

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn create(&self, certificate: EnergyCertificate) -> DomainResult<EnergyCertificate>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<EnergyCertificate>>;
    async fn update(&self, certificate: &EnergyCertificate) -> DomainResult<()>;
    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<EnergyCertificate>>;
    async fn list_by_status(
        &self,
        statuses: &[CertificateStatus],
    ) -> DomainResult<Vec<EnergyCertificate>>;

    async fn save_measure(&self, measure: EfficiencyMeasure) -> DomainResult<EfficiencyMeasure>;
    async fn find_measure(&self, id: i32) -> DomainResult<Option<EfficiencyMeasure>>;
}
