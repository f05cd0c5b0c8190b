//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::{conflict_or_db_err, db_err};
use crate::domain::user::{NewUser, UserRepository};
use crate::domain::{Address, DomainError, DomainResult, User, UserRole};
use crate::infrastructure::database::entities::{address, user};

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Household => UserRole::Household,
        user::UserRole::Installer => UserRole::Installer,
        user::UserRole::EnergyConsultant => UserRole::EnergyConsultant,
        user::UserRole::GridOperator => UserRole::GridOperator,
        user::UserRole::Admin => UserRole::Admin,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Household => user::UserRole::Household,
        UserRole::Installer => user::UserRole::Installer,
        UserRole::EnergyConsultant => user::UserRole::EnergyConsultant,
        UserRole::GridOperator => user::UserRole::GridOperator,
        UserRole::Admin => user::UserRole::Admin,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        is_active: model.is_active,
        address_id: model.address_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
    }
}

fn address_model_to_domain(model: address::Model) -> Address {
    Address {
        id: model.id,
        street: model.street,
        house_number: model.house_number,
        postal_code: model.postal_code,
        city: model.city,
        latitude: model.latitude,
        longitude: model.longitude,
    }
}

// ── Repository implementation ───────────────────────────────────

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: i32) -> DomainResult<user::ActiveModel> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(IntoActiveModel::into_active_model)
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    async fn save(&self, mut model: user::ActiveModel) -> DomainResult<()> {
        model.updated_at = Set(Utc::now());
        model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let now = Utc::now();
        let email = user.email.to_lowercase();

        let model = user::ActiveModel {
            name: Set(user.name),
            email: Set(email.clone()),
            password_hash: Set(user.password_hash),
            role: Set(domain_role_to_entity(user.role)),
            is_active: Set(true),
            address_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
            ..Default::default()
        };

        let saved = model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_or_db_err(e, || format!("email {} already registered", email)))?;

        info!("Created user {} ({})", saved.id, saved.email);
        Ok(user_model_to_domain(saved))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(user_model_to_domain))
    }

    async fn list(&self, role: Option<UserRole>) -> DomainResult<Vec<User>> {
        let mut query = user::Entity::find();
        if let Some(role) = role {
            query = query.filter(user::Column::Role.eq(domain_role_to_entity(role)));
        }
        let models = query
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(user_model_to_domain).collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn update_role(&self, id: i32, role: UserRole) -> DomainResult<()> {
        let mut model = self.load(id).await?;
        model.role = Set(domain_role_to_entity(role));
        self.save(model).await?;
        info!("User {} role changed to {}", id, role);
        Ok(())
    }

    async fn set_active(&self, id: i32, active: bool) -> DomainResult<()> {
        let mut model = self.load(id).await?;
        model.is_active = Set(active);
        self.save(model).await
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> DomainResult<()> {
        let mut model = self.load(id).await?;
        model.password_hash = Set(password_hash.to_string());
        self.save(model).await
    }

    async fn touch_last_login(&self, id: i32) -> DomainResult<()> {
        user::Entity::update_many()
            .col_expr(
                user::Column::LastLoginAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_address(&self, id: i32, address_id: i32) -> DomainResult<()> {
        let mut model = self.load(id).await?;
        model.address_id = Set(Some(address_id));
        self.save(model).await
    }

    async fn save_address(&self, address: Address) -> DomainResult<Address> {
        let model = address::ActiveModel {
            street: Set(address.street),
            house_number: Set(address.house_number),
            postal_code: Set(address.postal_code),
            city: Set(address.city),
            latitude: Set(address.latitude),
            longitude: Set(address.longitude),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        Ok(address_model_to_domain(saved))
    }

    async fn find_address(&self, id: i32) -> DomainResult<Option<Address>> {
        let model = address::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(address_model_to_domain))
    }
}
