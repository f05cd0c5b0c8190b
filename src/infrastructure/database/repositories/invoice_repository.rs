//! SeaORM implementation of InvoiceRepository

use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::{conflict_or_db_err, db_err, parse_column};
use crate::domain::invoice::{InvoiceRepository, PeriodKey};
use crate::domain::{DomainError, DomainResult, Invoice, PaymentStatus};
use crate::infrastructure::database::entities::invoice;

pub(super) fn entity_to_domain(m: invoice::Model) -> DomainResult<Invoice> {
    Ok(Invoice {
        id: m.id,
        issuer_id: m.issuer_id,
        recipient_id: m.recipient_id,
        contract_id: m.contract_id,
        request_id: m.request_id,
        certificate_id: m.certificate_id,
        amount_cents: m.amount_cents,
        issue_date: m.issue_date,
        due_date: m.due_date,
        category: parse_column("category", &m.category)?,
        payment_status: parse_column("payment_status", &m.payment_status)?,
        period_start: m.period_start,
        period_end: m.period_end,
        created_at: m.created_at,
    })
}

/// Inserts an invoice on any connection, so the cancellation settlement can
/// reuse it inside its transaction.
pub(super) async fn insert_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice: Invoice,
) -> DomainResult<Invoice> {
    let model = invoice::ActiveModel {
        issuer_id: Set(invoice.issuer_id),
        recipient_id: Set(invoice.recipient_id),
        contract_id: Set(invoice.contract_id),
        request_id: Set(invoice.request_id),
        certificate_id: Set(invoice.certificate_id),
        amount_cents: Set(invoice.amount_cents),
        issue_date: Set(invoice.issue_date),
        due_date: Set(invoice.due_date),
        category: Set(invoice.category.as_str().to_string()),
        payment_status: Set(invoice.payment_status.to_string()),
        period_start: Set(invoice.period_start),
        period_end: Set(invoice.period_end),
        created_at: Set(invoice.created_at),
        ..Default::default()
    };
    let saved = model.insert(conn).await.map_err(|e| {
        conflict_or_db_err(e, || {
            format!(
                "invoice for contract {:?} period {:?}..{:?} already exists",
                invoice.contract_id, invoice.period_start, invoice.period_end
            )
        })
    })?;
    info!(
        "Invoice {} issued: {} -> {} ({} cents, {})",
        saved.id, saved.issuer_id, saved.recipient_id, saved.amount_cents, saved.category
    );
    entity_to_domain(saved)
}

fn collect(models: Vec<invoice::Model>) -> DomainResult<Vec<Invoice>> {
    models.into_iter().map(entity_to_domain).collect()
}

pub struct SeaOrmInvoiceRepository {
    db: DatabaseConnection,
}

impl SeaOrmInvoiceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InvoiceRepository for SeaOrmInvoiceRepository {
    async fn create(&self, invoice: Invoice) -> DomainResult<Invoice> {
        insert_invoice(&self.db, invoice).await
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Invoice>> {
        invoice::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn list_for_party(&self, user_id: i32) -> DomainResult<Vec<Invoice>> {
        let models = invoice::Entity::find()
            .filter(
                sea_orm::Condition::any()
                    .add(invoice::Column::IssuerId.eq(user_id))
                    .add(invoice::Column::RecipientId.eq(user_id)),
            )
            .order_by_desc(invoice::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn list_all(&self) -> DomainResult<Vec<Invoice>> {
        let models = invoice::Entity::find()
            .order_by_desc(invoice::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn exists_for_period(&self, key: PeriodKey) -> DomainResult<bool> {
        let count = invoice::Entity::find()
            .filter(invoice::Column::IssuerId.eq(key.issuer_id))
            .filter(invoice::Column::ContractId.eq(key.contract_id))
            .filter(invoice::Column::PeriodStart.eq(key.period_start))
            .filter(invoice::Column::PeriodEnd.eq(key.period_end))
            .filter(invoice::Column::Category.eq(key.category.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn mark_paid(&self, id: i32) -> DomainResult<()> {
        let result = invoice::Entity::update_many()
            .col_expr(
                invoice::Column::PaymentStatus,
                sea_orm::sea_query::Expr::value(PaymentStatus::Paid.to_string()),
            )
            .filter(invoice::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Invoice", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::InvoiceCategory;
    use crate::infrastructure::database::repositories::test_support::migrated_db;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn period_invoice_is_written_once() {
        let repo = SeaOrmInvoiceRepository::new(migrated_db().await);
        let start = day(2025, 3, 1);
        let end = day(2026, 2, 28);
        let invoice = Invoice::new(3, 1, InvoiceCategory::GridOperatorInvoice, 117_000, end, 30)
            .for_contract(9)
            .with_period(start, end);
        let key = PeriodKey {
            issuer_id: 3,
            contract_id: 9,
            period_start: start,
            period_end: end,
            category: InvoiceCategory::GridOperatorInvoice,
        };

        assert!(!repo.exists_for_period(key).await.unwrap());
        let stored = repo.create(invoice.clone()).await.unwrap();
        assert_eq!(stored.due_date, day(2026, 3, 30));
        assert!(repo.exists_for_period(key).await.unwrap());
        assert!(matches!(
            repo.create(invoice).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn one_off_invoices_never_collide() {
        let repo = SeaOrmInvoiceRepository::new(migrated_db().await);
        let today = day(2025, 6, 1);
        for _ in 0..2 {
            repo.create(
                Invoice::new(2, 1, InvoiceCategory::InstallerInvoice, 900_000, today, 14)
                    .for_request(5),
            )
            .await
            .unwrap();
        }
        let listed = repo.list_for_party(1).await.unwrap();
        assert_eq!(listed.len(), 2);
        // newest first
        assert!(listed[0].id > listed[1].id);
        assert!(repo.list_for_party(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_paid_updates_status() {
        let repo = SeaOrmInvoiceRepository::new(migrated_db().await);
        let invoice = repo
            .create(Invoice::new(
                6,
                1,
                InvoiceCategory::ConsultantInvoice,
                15_000,
                day(2025, 1, 2),
                30,
            ))
            .await
            .unwrap();
        repo.mark_paid(invoice.id).await.unwrap();
        let stored = repo.find_by_id(invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert!(matches!(
            repo.mark_paid(404).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
