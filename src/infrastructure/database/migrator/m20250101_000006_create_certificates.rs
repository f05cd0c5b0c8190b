//! Create certificates and efficiency_measures tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Certificates::HouseholdId).integer().not_null())
                    .col(ColumnDef::new(Certificates::ConsultantId).integer())
                    .col(
                        ColumnDef::new(Certificates::Status)
                            .string_len(30)
                            .not_null()
                            .default("Requested"),
                    )
                    .col(ColumnDef::new(Certificates::MeasureId).integer())
                    .col(ColumnDef::new(Certificates::ValidFrom).date())
                    .col(ColumnDef::new(Certificates::ValidUntil).date())
                    .col(ColumnDef::new(Certificates::PriceCents).big_integer())
                    .col(
                        ColumnDef::new(Certificates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EfficiencyMeasures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EfficiencyMeasures::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EfficiencyMeasures::CertificateId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EfficiencyMeasures::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EfficiencyMeasures::EstimatedSavingsKwh)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_efficiency_measures_certificate_id")
                            .from(EfficiencyMeasures::Table, EfficiencyMeasures::CertificateId)
                            .to(Certificates::Table, Certificates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EfficiencyMeasures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Certificates::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Certificates {
    Table,
    Id,
    HouseholdId,
    ConsultantId,
    Status,
    MeasureId,
    ValidFrom,
    ValidUntil,
    PriceCents,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum EfficiencyMeasures {
    Table,
    Id,
    CertificateId,
    Description,
    EstimatedSavingsKwh,
}
