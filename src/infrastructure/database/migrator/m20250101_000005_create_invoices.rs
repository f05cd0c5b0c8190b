//! Create invoices table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invoices::IssuerId).integer().not_null())
                    .col(ColumnDef::new(Invoices::RecipientId).integer().not_null())
                    .col(ColumnDef::new(Invoices::ContractId).integer())
                    .col(ColumnDef::new(Invoices::RequestId).integer())
                    .col(ColumnDef::new(Invoices::CertificateId).integer())
                    .col(ColumnDef::new(Invoices::AmountCents).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::Category).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Invoices::PaymentStatus)
                            .string_len(10)
                            .not_null()
                            .default("Open"),
                    )
                    .col(ColumnDef::new(Invoices::PeriodStart).date())
                    .col(ColumnDef::new(Invoices::PeriodEnd).date())
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Billing idempotency: NULL periods (one-off invoices) never collide
        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_contract_period")
                    .table(Invoices::Table)
                    .col(Invoices::ContractId)
                    .col(Invoices::PeriodStart)
                    .col(Invoices::PeriodEnd)
                    .col(Invoices::Category)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_recipient_id")
                    .table(Invoices::Table)
                    .col(Invoices::RecipientId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Invoices {
    Table,
    Id,
    IssuerId,
    RecipientId,
    ContractId,
    RequestId,
    CertificateId,
    AmountCents,
    IssueDate,
    DueDate,
    Category,
    PaymentStatus,
    PeriodStart,
    PeriodEnd,
    CreatedAt,
}
