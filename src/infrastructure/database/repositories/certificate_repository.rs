//! SeaORM implementation of CertificateRepository

use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{db_err, parse_column};
use crate::domain::certificate::CertificateRepository;
use crate::domain::{
    CertificateStatus, DomainError, DomainResult, EfficiencyMeasure, EnergyCertificate,
};
use crate::infrastructure::database::entities::{certificate, efficiency_measure};

fn entity_to_domain(m: certificate::Model) -> DomainResult<EnergyCertificate> {
    Ok(EnergyCertificate {
        id: m.id,
        household_id: m.household_id,
        consultant_id: m.consultant_id,
        status: parse_column("status", &m.status)?,
        measure_id: m.measure_id,
        valid_from: m.valid_from,
        valid_until: m.valid_until,
        price_cents: m.price_cents,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(c: &EnergyCertificate) -> certificate::ActiveModel {
    certificate::ActiveModel {
        household_id: Set(c.household_id),
        consultant_id: Set(c.consultant_id),
        status: Set(c.status.as_str().to_string()),
        measure_id: Set(c.measure_id),
        valid_from: Set(c.valid_from),
        valid_until: Set(c.valid_until),
        price_cents: Set(c.price_cents),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
        ..Default::default()
    }
}

fn measure_to_domain(m: efficiency_measure::Model) -> EfficiencyMeasure {
    EfficiencyMeasure {
        id: m.id,
        certificate_id: m.certificate_id,
        description: m.description,
        estimated_savings_kwh: m.estimated_savings_kwh,
    }
}

pub struct SeaOrmCertificateRepository {
    db: DatabaseConnection,
}

impl SeaOrmCertificateRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CertificateRepository for SeaOrmCertificateRepository {
    async fn create(&self, certificate: EnergyCertificate) -> DomainResult<EnergyCertificate> {
        let saved = domain_to_active(&certificate)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        info!(
            "Certificate {} requested by household {}",
            saved.id, saved.household_id
        );
        entity_to_domain(saved)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<EnergyCertificate>> {
        certificate::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn update(&self, certificate: &EnergyCertificate) -> DomainResult<()> {
        let mut model = domain_to_active(certificate);
        model.id = Set(certificate.id);
        model.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => {
                DomainError::not_found("EnergyCertificate", certificate.id)
            }
            other => db_err(other),
        })?;
        Ok(())
    }

    async fn list_by_household(&self, household_id: i32) -> DomainResult<Vec<EnergyCertificate>> {
        certificate::Entity::find()
            .filter(certificate::Column::HouseholdId.eq(household_id))
            .order_by_asc(certificate::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(entity_to_domain)
            .collect()
    }

    async fn list_by_status(
        &self,
        statuses: &[CertificateStatus],
    ) -> DomainResult<Vec<EnergyCertificate>> {
        let values: Vec<&str> = statuses.iter().map(CertificateStatus::as_str).collect();
        certificate::Entity::find()
            .filter(certificate::Column::Status.is_in(values))
            .order_by_asc(certificate::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(entity_to_domain)
            .collect()
    }

    async fn save_measure(&self, measure: EfficiencyMeasure) -> DomainResult<EfficiencyMeasure> {
        let model = efficiency_measure::ActiveModel {
            certificate_id: Set(measure.certificate_id),
            description: Set(measure.description),
            estimated_savings_kwh: Set(measure.estimated_savings_kwh),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        Ok(measure_to_domain(saved))
    }

    async fn find_measure(&self, id: i32) -> DomainResult<Option<EfficiencyMeasure>> {
        let model = efficiency_measure::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(measure_to_domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::migrated_db;

    #[tokio::test]
    async fn measure_and_status_round_trip() {
        let repo = SeaOrmCertificateRepository::new(migrated_db().await);
        let mut cert = repo.create(EnergyCertificate::new(1)).await.unwrap();
        assert_eq!(cert.status, CertificateStatus::Requested);

        let measure = repo
            .save_measure(EfficiencyMeasure {
                id: 0,
                certificate_id: cert.id,
                description: "Dämmung der obersten Geschossdecke".into(),
                estimated_savings_kwh: 1800.0,
            })
            .await
            .unwrap();
        cert.enter_additional_data(5, measure.id).unwrap();
        repo.update(&cert).await.unwrap();

        let stored = repo.find_by_id(cert.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CertificateStatus::AdditionalDataEntered);
        assert_eq!(stored.consultant_id, Some(5));
        assert_eq!(
            repo.find_measure(measure.id).await.unwrap().unwrap().estimated_savings_kwh,
            1800.0
        );
        assert!(repo
            .list_by_status(&[CertificateStatus::Requested])
            .await
            .unwrap()
            .is_empty());
        assert_eq!(repo.list_by_household(1).await.unwrap().len(), 1);
    }
}
