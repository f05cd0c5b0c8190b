//! Create contracts and cancellation_requests tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // tariff_id carries no foreign key: a tariff whose contracts are all
        // cancelled may still be deleted
        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contracts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contracts::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(Contracts::TariffId).integer().not_null())
                    .col(ColumnDef::new(Contracts::OperatorId).integer().not_null())
                    .col(ColumnDef::new(Contracts::StartDate).date().not_null())
                    .col(ColumnDef::new(Contracts::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Contracts::AnnualChargeCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contracts::Status)
                            .string_len(30)
                            .not_null()
                            .default("Running"),
                    )
                    .col(
                        ColumnDef::new(Contracts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contracts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contracts_tariff_id")
                    .table(Contracts::Table)
                    .col(Contracts::TariffId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CancellationRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CancellationRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CancellationRequests::ContractId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CancellationRequests::RequestedBy)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CancellationRequests::ReplacementTariffId).integer())
                    .col(ColumnDef::new(CancellationRequests::Confirmed).boolean())
                    .col(
                        ColumnDef::new(CancellationRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CancellationRequests::ResolvedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cancellation_requests_contract_id")
                            .from(CancellationRequests::Table, CancellationRequests::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CancellationRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contracts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Contracts {
    Table,
    Id,
    HouseholdId,
    TariffId,
    OperatorId,
    StartDate,
    EndDate,
    AnnualChargeCents,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum CancellationRequests {
    Table,
    Id,
    ContractId,
    RequestedBy,
    ReplacementTariffId,
    Confirmed,
    CreatedAt,
    ResolvedAt,
}
