//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

use crate::domain::certificate::CertificateRepository;
use crate::domain::contract::ContractRepository;
use crate::domain::installation::InstallationRepository;
use crate::domain::invoice::InvoiceRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::tariff::TariffRepository;
use crate::domain::user::UserRepository;
use crate::domain::DomainResult;

use super::certificate_repository::SeaOrmCertificateRepository;
use super::contract_repository::SeaOrmContractRepository;
use super::db_err;
use super::installation_repository::SeaOrmInstallationRepository;
use super::invoice_repository::SeaOrmInvoiceRepository;
use super::tariff_repository::SeaOrmTariffRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let tariff = repos.tariffs().find_by_name("Basis").await?;
/// let open = repos.contracts().list_open().await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    users: SeaOrmUserRepository,
    installations: SeaOrmInstallationRepository,
    tariffs: SeaOrmTariffRepository,
    contracts: SeaOrmContractRepository,
    invoices: SeaOrmInvoiceRepository,
    certificates: SeaOrmCertificateRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            installations: SeaOrmInstallationRepository::new(db.clone()),
            tariffs: SeaOrmTariffRepository::new(db.clone()),
            contracts: SeaOrmContractRepository::new(db.clone()),
            invoices: SeaOrmInvoiceRepository::new(db.clone()),
            certificates: SeaOrmCertificateRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn installations(&self) -> &dyn InstallationRepository {
        &self.installations
    }

    fn tariffs(&self) -> &dyn TariffRepository {
        &self.tariffs
    }

    fn contracts(&self) -> &dyn ContractRepository {
        &self.contracts
    }

    fn invoices(&self) -> &dyn InvoiceRepository {
        &self.invoices
    }

    fn certificates(&self) -> &dyn CertificateRepository {
        &self.certificates
    }

    async fn ping(&self) -> DomainResult<()> {
        let backend = self.db.get_database_backend();
        self.db
            .execute(Statement::from_string(backend, "SELECT 1"))
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::migrated_db;

    #[tokio::test]
    async fn ping_succeeds_on_open_connection() {
        let repos = SeaOrmRepositoryProvider::new(migrated_db().await);
        repos.ping().await.unwrap();
        assert_eq!(repos.users().count().await.unwrap(), 0);
    }
}
