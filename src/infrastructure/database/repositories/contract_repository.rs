//! SeaORM implementation of ContractRepository
//!
//! Confirming a cancellation touches three tables; `settle_cancellation`
//! runs it inside one database transaction.

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};

use super::invoice_repository::insert_invoice;
use super::{db_err, parse_column};
use crate::domain::contract::{CancellationSettlement, ContractRepository, SettledCancellation};
use crate::domain::{CancellationRequest, Contract, ContractStatus, DomainError, DomainResult};
use crate::infrastructure::database::entities::{cancellation_request, contract};

// ── Conversion helpers ──────────────────────────────────────────

fn entity_to_domain(m: contract::Model) -> DomainResult<Contract> {
    Ok(Contract {
        id: m.id,
        household_id: m.household_id,
        tariff_id: m.tariff_id,
        operator_id: m.operator_id,
        start_date: m.start_date,
        end_date: m.end_date,
        annual_charge_cents: m.annual_charge_cents,
        status: parse_column("status", &m.status)?,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn cancellation_to_domain(m: cancellation_request::Model) -> CancellationRequest {
    CancellationRequest {
        id: m.id,
        contract_id: m.contract_id,
        requested_by: m.requested_by,
        replacement_tariff_id: m.replacement_tariff_id,
        confirmed: m.confirmed,
        created_at: m.created_at,
        resolved_at: m.resolved_at,
    }
}

fn collect(models: Vec<contract::Model>) -> DomainResult<Vec<Contract>> {
    models.into_iter().map(entity_to_domain).collect()
}

fn open_filter() -> sea_orm::sea_query::SimpleExpr {
    contract::Column::Status.ne(ContractStatus::Cancelled.as_str())
}

async fn insert_contract<C: ConnectionTrait>(conn: &C, c: Contract) -> DomainResult<Contract> {
    let model = contract::ActiveModel {
        household_id: Set(c.household_id),
        tariff_id: Set(c.tariff_id),
        operator_id: Set(c.operator_id),
        start_date: Set(c.start_date),
        end_date: Set(c.end_date),
        annual_charge_cents: Set(c.annual_charge_cents),
        status: Set(c.status.as_str().to_string()),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
        ..Default::default()
    };
    let saved = model.insert(conn).await.map_err(db_err)?;
    info!(
        "Contract {} created: household {} on tariff {}",
        saved.id, saved.household_id, saved.tariff_id
    );
    entity_to_domain(saved)
}

async fn set_contract_status<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    status: ContractStatus,
) -> DomainResult<()> {
    let mut model = contract::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Contract", id))?
        .into_active_model();
    model.status = Set(status.as_str().to_string());
    model.updated_at = Set(Utc::now());
    model.update(conn).await.map_err(db_err)?;
    Ok(())
}

async fn resolve_cancellation<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    confirmed: bool,
) -> DomainResult<()> {
    cancellation_request::Entity::update_many()
        .col_expr(
            cancellation_request::Column::Confirmed,
            sea_orm::sea_query::Expr::value(Some(confirmed)),
        )
        .col_expr(
            cancellation_request::Column::ResolvedAt,
            sea_orm::sea_query::Expr::value(Some(Utc::now())),
        )
        .filter(cancellation_request::Column::Id.eq(id))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

// ── SeaOrmContractRepository ────────────────────────────────────

pub struct SeaOrmContractRepository {
    db: DatabaseConnection,
}

impl SeaOrmContractRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list_where(&self, condition: sea_orm::Condition) -> DomainResult<Vec<Contract>> {
        let models = contract::Entity::find()
            .filter(condition)
            .order_by_asc(contract::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn any(&self, condition: sea_orm::Condition) -> DomainResult<bool> {
        let count = contract::Entity::find()
            .filter(condition)
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

#[async_trait]
impl ContractRepository for SeaOrmContractRepository {
    async fn create(&self, contract: Contract) -> DomainResult<Contract> {
        insert_contract(&self.db, contract).await
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Contract>> {
        contract::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<Contract>> {
        self.list_where(
            sea_orm::Condition::all().add(contract::Column::HouseholdId.eq(household_id)),
        )
        .await
    }

    async fn list_by_operator(&self, operator_id: i32) -> DomainResult<Vec<Contract>> {
        self.list_where(
            sea_orm::Condition::all().add(contract::Column::OperatorId.eq(operator_id)),
        )
        .await
    }

    async fn list_open(&self) -> DomainResult<Vec<Contract>> {
        self.list_where(sea_orm::Condition::all().add(open_filter()))
            .await
    }

    async fn exists_open_for_tariff(&self, tariff_id: i32) -> DomainResult<bool> {
        self.any(
            sea_orm::Condition::all()
                .add(contract::Column::TariffId.eq(tariff_id))
                .add(open_filter()),
        )
        .await
    }

    async fn exists_open_for(&self, household_id: i32, tariff_id: i32) -> DomainResult<bool> {
        self.any(
            sea_orm::Condition::all()
                .add(contract::Column::HouseholdId.eq(household_id))
                .add(contract::Column::TariffId.eq(tariff_id))
                .add(open_filter()),
        )
        .await
    }

    async fn open_cancellation(
        &self,
        request: CancellationRequest,
    ) -> DomainResult<CancellationRequest> {
        let txn = self.db.begin().await.map_err(db_err)?;

        set_contract_status(&txn, request.contract_id, ContractStatus::CancellationPending)
            .await?;
        let model = cancellation_request::ActiveModel {
            contract_id: Set(request.contract_id),
            requested_by: Set(request.requested_by),
            replacement_tariff_id: Set(request.replacement_tariff_id),
            confirmed: Set(None),
            created_at: Set(request.created_at),
            resolved_at: Set(None),
            ..Default::default()
        };
        let saved = model.insert(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        info!(
            "Cancellation {} opened for contract {}",
            saved.id, saved.contract_id
        );
        Ok(cancellation_to_domain(saved))
    }

    async fn find_pending_cancellation(
        &self,
        contract_id: i32,
    ) -> DomainResult<Option<CancellationRequest>> {
        let model = cancellation_request::Entity::find()
            .filter(cancellation_request::Column::ContractId.eq(contract_id))
            .filter(cancellation_request::Column::Confirmed.is_null())
            .order_by_desc(cancellation_request::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(cancellation_to_domain))
    }

    async fn list_pending_cancellations(
        &self,
        operator_id: i32,
    ) -> DomainResult<Vec<CancellationRequest>> {
        let models = cancellation_request::Entity::find()
            .join(
                sea_orm::JoinType::InnerJoin,
                cancellation_request::Relation::Contract.def(),
            )
            .filter(contract::Column::OperatorId.eq(operator_id))
            .filter(cancellation_request::Column::Confirmed.is_null())
            .order_by_asc(cancellation_request::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(cancellation_to_domain).collect())
    }

    async fn settle_cancellation(
        &self,
        settlement: CancellationSettlement,
    ) -> DomainResult<SettledCancellation> {
        let txn = self.db.begin().await.map_err(db_err)?;

        set_contract_status(&txn, settlement.contract_id, ContractStatus::Cancelled).await?;
        resolve_cancellation(&txn, settlement.cancellation_id, true).await?;
        let invoice = insert_invoice(&txn, settlement.invoice).await?;
        let replacement = match settlement.replacement {
            Some(c) => Some(insert_contract(&txn, c).await?),
            None => None,
        };

        // dropping the transaction on any `?` above rolls everything back
        txn.commit().await.map_err(db_err)?;
        info!(
            "Contract {} cancelled, final invoice {}",
            settlement.contract_id, invoice.id
        );
        Ok(SettledCancellation {
            invoice,
            replacement,
        })
    }

    async fn reject_cancellation(
        &self,
        contract_id: i32,
        cancellation_id: i32,
    ) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        set_contract_status(&txn, contract_id, ContractStatus::Running).await?;
        resolve_cancellation(&txn, cancellation_id, false).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::invoice::InvoiceRepository;
    use crate::domain::{Invoice, InvoiceCategory, Tariff};
    use crate::infrastructure::database::repositories::invoice_repository::SeaOrmInvoiceRepository;
    use crate::infrastructure::database::repositories::test_support::migrated_db;

    fn tariff() -> Tariff {
        let mut t = Tariff::new(3, "Basis".into(), 30, 12_000, 12);
        t.id = 1;
        t
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn final_invoice(contract_id: i32) -> Invoice {
        Invoice::new(3, 1, InvoiceCategory::GridOperatorInvoice, 5_000, start(), 30)
            .for_contract(contract_id)
            .with_period(start(), NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
    }

    #[tokio::test]
    async fn open_and_reject_cancellation() {
        let repo = SeaOrmContractRepository::new(migrated_db().await);
        let c = repo
            .create(Contract::new(1, &tariff(), start(), 3500).unwrap())
            .await
            .unwrap();
        assert!(repo.exists_open_for(1, 1).await.unwrap());

        let req = repo
            .open_cancellation(CancellationRequest::new(c.id, 1, None))
            .await
            .unwrap();
        let stored = repo.find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::CancellationPending);
        assert_eq!(repo.list_pending_cancellations(3).await.unwrap().len(), 1);
        assert!(repo.list_pending_cancellations(4).await.unwrap().is_empty());

        repo.reject_cancellation(c.id, req.id).await.unwrap();
        let stored = repo.find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::Running);
        assert!(repo.find_pending_cancellation(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settlement_writes_invoice_and_replacement() {
        let db = migrated_db().await;
        let repo = SeaOrmContractRepository::new(db.clone());
        let c = repo
            .create(Contract::new(1, &tariff(), start(), 3500).unwrap())
            .await
            .unwrap();
        let req = repo
            .open_cancellation(CancellationRequest::new(c.id, 1, Some(1)))
            .await
            .unwrap();

        let settled = repo
            .settle_cancellation(CancellationSettlement {
                contract_id: c.id,
                cancellation_id: req.id,
                invoice: final_invoice(c.id),
                replacement: Some(Contract::new(1, &tariff(), start(), 3500).unwrap()),
            })
            .await
            .unwrap();

        assert_eq!(settled.invoice.contract_id, Some(c.id));
        let replacement = settled.replacement.unwrap();
        assert_eq!(replacement.status, ContractStatus::Running);
        assert_eq!(repo.list_open().await.unwrap().len(), 1);
        assert_eq!(
            repo.find_by_id(c.id).await.unwrap().unwrap().status,
            ContractStatus::Cancelled
        );
        assert!(!repo.exists_open_for_tariff(2).await.unwrap());
    }

    #[tokio::test]
    async fn failed_settlement_rolls_back() {
        let db = migrated_db().await;
        let repo = SeaOrmContractRepository::new(db.clone());
        let invoices = SeaOrmInvoiceRepository::new(db);
        let c = repo
            .create(Contract::new(1, &tariff(), start(), 3500).unwrap())
            .await
            .unwrap();
        let req = repo
            .open_cancellation(CancellationRequest::new(c.id, 1, None))
            .await
            .unwrap();
        // the final invoice already exists, so the insert hits the unique index
        invoices.create(final_invoice(c.id)).await.unwrap();

        let err = repo
            .settle_cancellation(CancellationSettlement {
                contract_id: c.id,
                cancellation_id: req.id,
                invoice: final_invoice(c.id),
                replacement: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let stored = repo.find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContractStatus::CancellationPending);
        assert_eq!(
            repo.find_pending_cancellation(c.id).await.unwrap().map(|r| r.id),
            Some(req.id)
        );
    }
}
