//! SeaORM implementation of InstallationRepository

use async_trait::async_trait;
use log::{debug, info};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{conflict_or_db_err, db_err, parse_column, parse_optional};
use crate::domain::installation::InstallationRepository;
use crate::domain::{DomainError, DomainResult, InstallationRequest, Offer, ProcessStatus};
use crate::infrastructure::database::entities::{installation_request, offer};

fn entity_to_domain(m: installation_request::Model) -> DomainResult<InstallationRequest> {
    Ok(InstallationRequest {
        id: m.id,
        household_id: m.household_id,
        installer_id: m.installer_id,
        grid_operator_id: m.grid_operator_id,
        certificate_id: m.certificate_id,
        status: parse_column("status", &m.status)?,
        grid_compatible: m.grid_compatible,
        module_type: m.module_type,
        capacity_kw: m.capacity_kw,
        area_m2: m.area_m2,
        mounting_system: parse_optional("mounting_system", m.mounting_system)?,
        shading: parse_optional("shading", m.shading)?,
        orientation: parse_optional("orientation", m.orientation)?,
        inclination_deg: m.inclination_deg,
        offer_cost_cents: m.offer_cost_cents,
        notes: m.notes,
        feed_in_granted_at: m.feed_in_granted_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(r: &InstallationRequest) -> installation_request::ActiveModel {
    installation_request::ActiveModel {
        household_id: Set(r.household_id),
        installer_id: Set(r.installer_id),
        grid_operator_id: Set(r.grid_operator_id),
        certificate_id: Set(r.certificate_id),
        status: Set(r.status.as_str().to_string()),
        grid_compatible: Set(r.grid_compatible),
        module_type: Set(r.module_type.clone()),
        capacity_kw: Set(r.capacity_kw),
        area_m2: Set(r.area_m2),
        mounting_system: Set(r.mounting_system.map(|m| m.as_str().to_string())),
        shading: Set(r.shading.map(|s| s.as_str().to_string())),
        orientation: Set(r.orientation.map(|o| o.as_str().to_string())),
        inclination_deg: Set(r.inclination_deg),
        offer_cost_cents: Set(r.offer_cost_cents),
        notes: Set(r.notes.clone()),
        feed_in_granted_at: Set(r.feed_in_granted_at),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
        ..Default::default()
    }
}

fn offer_to_domain(m: offer::Model) -> Offer {
    Offer {
        id: m.id,
        request_id: m.request_id,
        installer_id: m.installer_id,
        cost_cents: m.cost_cents,
        created_at: m.created_at,
    }
}

fn collect(models: Vec<installation_request::Model>) -> DomainResult<Vec<InstallationRequest>> {
    models.into_iter().map(entity_to_domain).collect()
}

pub struct SeaOrmInstallationRepository {
    db: DatabaseConnection,
}

impl SeaOrmInstallationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list_where(
        &self,
        condition: sea_orm::Condition,
    ) -> DomainResult<Vec<InstallationRequest>> {
        let models = installation_request::Entity::find()
            .filter(condition)
            .order_by_asc(installation_request::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }
}

#[async_trait]
impl InstallationRepository for SeaOrmInstallationRepository {
    async fn create(&self, request: InstallationRequest) -> DomainResult<InstallationRequest> {
        let saved = domain_to_active(&request)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        info!(
            "Installation request {} created for household {}",
            saved.id, saved.household_id
        );
        entity_to_domain(saved)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<InstallationRequest>> {
        installation_request::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn update(&self, request: &InstallationRequest) -> DomainResult<()> {
        let mut model = domain_to_active(request);
        model.id = Set(request.id);
        model.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => {
                DomainError::not_found("InstallationRequest", request.id)
            }
            other => db_err(other),
        })?;
        debug!("Installation request {} now {}", request.id, request.status);
        Ok(())
    }

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<InstallationRequest>> {
        self.list_where(
            sea_orm::Condition::all()
                .add(installation_request::Column::HouseholdId.eq(household_id)),
        )
        .await
    }

    async fn list_by_installer(&self, installer_id: i32) -> DomainResult<Vec<InstallationRequest>> {
        self.list_where(
            sea_orm::Condition::all()
                .add(installation_request::Column::InstallerId.eq(installer_id)),
        )
        .await
    }

    async fn list_by_status(
        &self,
        statuses: &[ProcessStatus],
    ) -> DomainResult<Vec<InstallationRequest>> {
        let values: Vec<&str> = statuses.iter().map(ProcessStatus::as_str).collect();
        self.list_where(
            sea_orm::Condition::all().add(installation_request::Column::Status.is_in(values)),
        )
        .await
    }

    async fn list_by_certificate(
        &self,
        certificate_id: i32,
    ) -> DomainResult<Vec<InstallationRequest>> {
        self.list_where(
            sea_orm::Condition::all()
                .add(installation_request::Column::CertificateId.eq(certificate_id)),
        )
        .await
    }

    async fn save_offer(&self, offer: Offer) -> DomainResult<Offer> {
        let request_id = offer.request_id;
        let model = offer::ActiveModel {
            request_id: Set(offer.request_id),
            installer_id: Set(offer.installer_id),
            cost_cents: Set(offer.cost_cents),
            created_at: Set(offer.created_at),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await.map_err(|e| {
            conflict_or_db_err(e, || format!("offer for request {} already exists", request_id))
        })?;
        Ok(offer_to_domain(saved))
    }

    async fn find_offer(&self, request_id: i32) -> DomainResult<Option<Offer>> {
        let model = offer::Entity::find()
            .filter(offer::Column::RequestId.eq(request_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(offer_to_domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::{MountingSystem, Orientation, ShadingClass};
    use crate::infrastructure::database::repositories::test_support::migrated_db;

    #[tokio::test]
    async fn plan_columns_survive_update() {
        let repo = SeaOrmInstallationRepository::new(migrated_db().await);
        let mut request = repo
            .create(InstallationRequest::new(4, Some("Süddach".into())))
            .await
            .unwrap();
        assert_eq!(request.status, ProcessStatus::Requested);

        request.status = ProcessStatus::PlanCreated;
        request.installer_id = Some(2);
        request.mounting_system = Some(MountingSystem::FreeFieldMounting);
        request.shading = Some(ShadingClass::MinimalShade);
        request.orientation = Some(Orientation::SW);
        request.capacity_kw = Some(9.8);
        repo.update(&request).await.unwrap();

        let stored = repo.find_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(stored.mounting_system, Some(MountingSystem::FreeFieldMounting));
        assert_eq!(stored.orientation, Some(Orientation::SW));
        assert_eq!(stored.notes.as_deref(), Some("Süddach"));

        let by_status = repo
            .list_by_status(&[ProcessStatus::PlanCreated, ProcessStatus::Approved])
            .await
            .unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(repo.list_by_installer(2).await.unwrap().len(), 1);
        assert!(repo.list_by_household(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_offer_conflicts() {
        let repo = SeaOrmInstallationRepository::new(migrated_db().await);
        let request = repo.create(InstallationRequest::new(1, None)).await.unwrap();
        let offer = Offer {
            id: 0,
            request_id: request.id,
            installer_id: 2,
            cost_cents: 1_250_000,
            created_at: Utc::now(),
        };
        repo.save_offer(offer.clone()).await.unwrap();
        assert!(matches!(
            repo.save_offer(offer).await,
            Err(DomainError::Conflict(_))
        ));
        let found = repo.find_offer(request.id).await.unwrap().unwrap();
        assert_eq!(found.cost_cents, 1_250_000);
    }

    #[tokio::test]
    async fn updating_missing_request_is_not_found() {
        let repo = SeaOrmInstallationRepository::new(migrated_db().await);
        let mut ghost = InstallationRequest::new(1, None);
        ghost.id = 42;
        assert!(matches!(
            repo.update(&ghost).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
