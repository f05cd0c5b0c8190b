//! Repository provider for the domain layer

use async_trait::async_trait;

use super::certificate::CertificateRepository;
use super::contract::ContractRepository;
use super::installation::InstallationRepository;
use super::invoice::InvoiceRepository;
use super::tariff::TariffRepository;
use super::user::UserRepository;
use super::DomainResult;

/// Provides access to all domain repositories.
///
/// Services hold an `Arc<dyn RepositoryProvider>` and ask for the
/// repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let req = repos.installations().find_by_id(7).await?;
///     let offer = repos.installations().find_offer(7).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn installations(&self) -> &dyn InstallationRepository;
    fn tariffs(&self) -> &dyn TariffRepository;
    fn contracts(&self) -> &dyn ContractRepository;
    fn invoices(&self) -> &dyn InvoiceRepository;
    fn certificates(&self) -> &dyn CertificateRepository;

    /// Cheap round trip to the backing store, used by the health check.
    async fn ping(&self) -> DomainResult<()>;
}
