//! Create installation_requests and offers tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InstallationRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstallationRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InstallationRequests::HouseholdId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InstallationRequests::InstallerId).integer())
                    .col(ColumnDef::new(InstallationRequests::GridOperatorId).integer())
                    .col(ColumnDef::new(InstallationRequests::CertificateId).integer())
                    .col(
                        ColumnDef::new(InstallationRequests::Status)
                            .string_len(30)
                            .not_null()
                            .default("Requested"),
                    )
                    .col(ColumnDef::new(InstallationRequests::GridCompatible).boolean())
                    .col(ColumnDef::new(InstallationRequests::ModuleType).string())
                    .col(ColumnDef::new(InstallationRequests::CapacityKw).double())
                    .col(ColumnDef::new(InstallationRequests::AreaM2).double())
                    .col(ColumnDef::new(InstallationRequests::MountingSystem).string_len(30))
                    .col(ColumnDef::new(InstallationRequests::Shading).string_len(20))
                    .col(ColumnDef::new(InstallationRequests::Orientation).string_len(20))
                    .col(ColumnDef::new(InstallationRequests::InclinationDeg).double())
                    .col(ColumnDef::new(InstallationRequests::OfferCostCents).big_integer())
                    .col(ColumnDef::new(InstallationRequests::Notes).text())
                    .col(
                        ColumnDef::new(InstallationRequests::FeedInGrantedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(InstallationRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallationRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_installation_requests_status")
                    .table(InstallationRequests::Table)
                    .col(InstallationRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Offers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Offers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Offers::RequestId).integer().not_null())
                    .col(ColumnDef::new(Offers::InstallerId).integer().not_null())
                    .col(ColumnDef::new(Offers::CostCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Offers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offers_request_id")
                            .from(Offers::Table, Offers::RequestId)
                            .to(InstallationRequests::Table, InstallationRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One offer per request
        manager
            .create_index(
                Index::create()
                    .name("idx_offers_request_id")
                    .table(Offers::Table)
                    .col(Offers::RequestId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Offers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InstallationRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum InstallationRequests {
    Table,
    Id,
    HouseholdId,
    InstallerId,
    GridOperatorId,
    CertificateId,
    Status,
    GridCompatible,
    ModuleType,
    CapacityKw,
    AreaM2,
    MountingSystem,
    Shading,
    Orientation,
    InclinationDeg,
    OfferCostCents,
    Notes,
    FeedInGrantedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Offers {
    Table,
    Id,
    RequestId,
    InstallerId,
    CostCents,
    CreatedAt,
}
