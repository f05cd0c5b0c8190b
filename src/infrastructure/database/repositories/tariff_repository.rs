//! SeaORM implementation of TariffRepository

use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{conflict_or_db_err, db_err};
use crate::domain::tariff::TariffRepository;
use crate::domain::{DomainError, DomainResult, Tariff};
use crate::infrastructure::database::entities::tariff;

// ── Conversion helpers ──────────────────────────────────────────

fn entity_to_domain(t: tariff::Model) -> Tariff {
    Tariff {
        id: t.id,
        operator_id: t.operator_id,
        name: t.name,
        price_per_kwh_cents: t.price_per_kwh_cents,
        base_fee_cents: t.base_fee_cents,
        term_months: t.term_months.max(0) as u32,
        is_active: t.is_active,
        created_at: t.created_at,
        updated_at: t.updated_at,
    }
}

fn domain_to_active(t: &Tariff) -> tariff::ActiveModel {
    tariff::ActiveModel {
        operator_id: Set(t.operator_id),
        name: Set(t.name.clone()),
        price_per_kwh_cents: Set(t.price_per_kwh_cents),
        base_fee_cents: Set(t.base_fee_cents),
        term_months: Set(t.term_months as i32),
        is_active: Set(t.is_active),
        created_at: Set(t.created_at),
        updated_at: Set(t.updated_at),
        ..Default::default()
    }
}

fn name_taken(name: &str) -> String {
    format!("tariff name '{}' already exists", name)
}

// ── SeaOrmTariffRepository ──────────────────────────────────────

pub struct SeaOrmTariffRepository {
    db: DatabaseConnection,
}

impl SeaOrmTariffRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list(&self, filter: Option<sea_orm::Condition>) -> DomainResult<Vec<Tariff>> {
        let mut query = tariff::Entity::find();
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        let models = query
            .order_by_asc(tariff::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }
}

#[async_trait]
impl TariffRepository for SeaOrmTariffRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>> {
        let model = tariff::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Tariff>> {
        let model = tariff::Entity::find()
            .filter(tariff::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Tariff>> {
        self.list(None).await
    }

    async fn find_active(&self) -> DomainResult<Vec<Tariff>> {
        self.list(Some(
            sea_orm::Condition::all().add(tariff::Column::IsActive.eq(true)),
        ))
        .await
    }

    async fn find_by_operator(&self, operator_id: i32) -> DomainResult<Vec<Tariff>> {
        self.list(Some(
            sea_orm::Condition::all().add(tariff::Column::OperatorId.eq(operator_id)),
        ))
        .await
    }

    async fn save(&self, tariff: Tariff) -> DomainResult<Tariff> {
        let saved = domain_to_active(&tariff)
            .insert(&self.db)
            .await
            .map_err(|e| conflict_or_db_err(e, || name_taken(&tariff.name)))?;
        info!("Created tariff {} '{}'", saved.id, saved.name);
        Ok(entity_to_domain(saved))
    }

    async fn update(&self, tariff: &Tariff) -> DomainResult<()> {
        let mut model = domain_to_active(tariff);
        model.id = Set(tariff.id);
        model.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => DomainError::not_found("Tariff", tariff.id),
            other => conflict_or_db_err(other, || name_taken(&tariff.name)),
        })?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let result = tariff::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Tariff", id));
        }
        info!("Deleted tariff {}", id);
        Ok(())
    }
}
