//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_installation_requests;
mod m20250101_000003_create_tariffs;
mod m20250101_000004_create_contracts;
mod m20250101_000005_create_invoices;
mod m20250101_000006_create_certificates;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_installation_requests::Migration),
            Box::new(m20250101_000003_create_tariffs::Migration),
            Box::new(m20250101_000004_create_contracts::Migration),
            Box::new(m20250101_000005_create_invoices::Migration),
            Box::new(m20250101_000006_create_certificates::Migration),
        ]
    }
}
