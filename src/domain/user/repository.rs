use async_trait::async_trait;

use super::{Address, NewUser, User, UserRole};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> DomainResult<User>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn list(&self, role: Option<UserRole>) -> DomainResult<Vec<User>>;
    async fn count(&self) -> DomainResult<u64>;

    async fn update_role(&self, id: i32, role: UserRole) -> DomainResult<()>;
    async fn set_active(&self, id: i32, active: bool) -> DomainResult<()>;
    async fn update_password(&self, id: i32, password_hash: &str) -> DomainResult<()>;
    async fn touch_last_login(&self, id: i32) -> DomainResult<()>;
    async fn set_address(&self, id: i32, address_id: i32) -> DomainResult<()>;

    /// Stores a new address; `address.id` is ignored.
    async fn save_address(&self, address: Address) -> DomainResult<Address>;
    async fn find_address(&self, id: i32) -> DomainResult<Option<Address>>;
}
