//! Tariff repository interface

use async_trait::async_trait;

use super::model::Tariff;
use crate::domain::DomainResult;

#[async_trait]
pub trait TariffRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>>;
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Tariff>>;
    async fn find_all(&self) -> DomainResult<Vec<Tariff>>;
    async fn find_active(&self) -> DomainResult<Vec<Tariff>>;
    async fn find_by_operator(&self, operator_id: i32) -> DomainResult<Vec<Tariff>>;
    async fn save(&self, tariff: Tariff) -> DomainResult<Tariff>;
    async fn update(&self, tariff: &Tariff) -> DomainResult<()>;
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
