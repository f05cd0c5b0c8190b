//! Identity service
//!
//! Token issuance and resolution, role checks, self-registration, user
//! administration and addresses. HTTP handlers are thin wrappers around it.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::ports::Geocoder;
use crate::domain::user::NewUser;
use crate::domain::{Address, DomainError, DomainResult, RepositoryProvider, User, UserRole};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::PaginatedResult;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Self-registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
}

/// Fails with `Forbidden` unless the user's role is in `allowed`.
pub fn require_role(user: &User, allowed: &[UserRole]) -> DomainResult<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "Rolle {} ist für diese Aktion nicht berechtigt",
            user.role
        )))
    }
}

pub struct IdentityService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    geocoder: Arc<dyn Geocoder>,
}

impl IdentityService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        jwt_config: JwtConfig,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            repos,
            jwt_config,
            geocoder,
        }
    }

    // ── Authentication ──────────────────────────────────────────

    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let user = self
            .repos
            .users()
            .find_by_email(email)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "User",
                field: "email",
                value: email.to_string(),
            })?;

        if !user.is_active {
            return Err(DomainError::Forbidden("Konto ist deaktiviert".into()));
        }

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            error!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            DomainError::Internal(format!("failed to verify password: {}", e))
        })?;
        if !valid {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(DomainError::Unauthorized("Falsches Passwort".into()));
        }

        let token = create_token(user.id, &user.email, user.role.as_str(), &self.jwt_config)
            .map_err(|e| DomainError::Internal(format!("failed to create token: {}", e)))?;

        self.repos.users().touch_last_login(user.id).await?;
        info!(user_id = user.id, role = %user.role, "User logged in");

        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    /// Maps a bearer token to its active user.
    pub async fn resolve(&self, token: &str) -> DomainResult<User> {
        let claims = verify_token(token, &self.jwt_config)
            .map_err(|e| DomainError::Unauthorized(format!("Ungültiges Token: {}", e)))?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| DomainError::Unauthorized("Ungültiges Token".into()))?;

        match self.repos.users().find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(DomainError::Unauthorized(
                "Benutzer existiert nicht oder ist deaktiviert".into(),
            )),
        }
    }

    // ── Registration ────────────────────────────────────────────

    pub async fn register(&self, registration: Registration) -> DomainResult<User> {
        if registration.role == UserRole::Admin {
            return Err(DomainError::Forbidden(
                "Administratoren können sich nicht selbst registrieren".into(),
            ));
        }
        if registration.password.len() < 8 {
            return Err(DomainError::BadRequest(
                "Password must be at least 8 characters".into(),
            ));
        }
        if !registration.email.contains('@') {
            return Err(DomainError::BadRequest("Invalid email address".into()));
        }
        if self
            .repos
            .users()
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict("E-Mail ist bereits registriert".into()));
        }

        let user = self
            .create_user(
                &registration.name,
                &registration.email,
                &registration.password,
                registration.role,
            )
            .await?;
        info!(user_id = user.id, role = %user.role, "New user registered");
        Ok(user)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> DomainResult<User> {
        let password_hash = hash_password(password)
            .map_err(|e| DomainError::Internal(format!("failed to hash password: {}", e)))?;
        self.repos
            .users()
            .create(NewUser {
                name: name.to_string(),
                email: email.to_lowercase(),
                password_hash,
                role,
            })
            .await
    }

    /// Creates the configured admin account when the user table is empty.
    pub async fn ensure_default_admin(
        &self,
        email: &str,
        password: &str,
    ) -> DomainResult<Option<User>> {
        if self.repos.users().count().await? > 0 {
            return Ok(None);
        }
        let admin = self
            .create_user("Administrator", email, password, UserRole::Admin)
            .await?;
        info!(user_id = admin.id, email, "Default admin created");
        Ok(Some(admin))
    }

    // ── Profile ─────────────────────────────────────────────────

    pub async fn get_user(&self, id: i32) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        if new_password.len() < 8 {
            return Err(DomainError::BadRequest(
                "New password must be at least 8 characters".into(),
            ));
        }
        let valid = verify_password(current_password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized("Aktuelles Passwort ist falsch".into()));
        }

        let new_hash = hash_password(new_password)
            .map_err(|e| DomainError::Internal(format!("failed to hash password: {}", e)))?;
        self.repos.users().update_password(user.id, &new_hash).await?;

        info!(user_id = user.id, "Password changed");
        Ok(())
    }

    /// Stores a new address for the user. Coordinates stay empty when the
    /// geocoder cannot resolve it.
    pub async fn set_address(&self, user: &User, input: NewAddress) -> DomainResult<Address> {
        let mut address = Address {
            id: 0,
            street: input.street,
            house_number: input.house_number,
            postal_code: input.postal_code,
            city: input.city,
            latitude: None,
            longitude: None,
        };
        if let Some((lat, lon)) = self.geocoder.geocode(&address.one_line()).await {
            address.latitude = Some(lat);
            address.longitude = Some(lon);
        }

        let address = self.repos.users().save_address(address).await?;
        self.repos.users().set_address(user.id, address.id).await?;
        info!(
            user_id = user.id,
            address_id = address.id,
            geocoded = address.latitude.is_some(),
            "Address updated"
        );
        Ok(address)
    }

    pub async fn get_address(&self, user: &User) -> DomainResult<Option<Address>> {
        match user.address_id {
            Some(id) => self.repos.users().find_address(id).await,
            None => Ok(None),
        }
    }

    // ── Administration ──────────────────────────────────────────

    pub async fn list_users(
        &self,
        actor: &User,
        role: Option<UserRole>,
        page: u32,
        limit: u32,
    ) -> DomainResult<PaginatedResult<User>> {
        require_role(actor, &[UserRole::Admin])?;
        let users = self.repos.users().list(role).await?;
        Ok(PaginatedResult::from_vec(users, page, limit))
    }

    pub async fn admin_get_user(&self, actor: &User, id: i32) -> DomainResult<User> {
        require_role(actor, &[UserRole::Admin])?;
        self.get_user(id).await
    }

    pub async fn change_role(&self, actor: &User, id: i32, role: UserRole) -> DomainResult<User> {
        require_role(actor, &[UserRole::Admin])?;
        if actor.id == id && role != UserRole::Admin {
            return Err(DomainError::Conflict(
                "Administratoren können sich nicht selbst herabstufen".into(),
            ));
        }
        self.get_user(id).await?;
        self.repos.users().update_role(id, role).await?;
        info!(actor_id = actor.id, user_id = id, role = %role, "User role changed");
        self.get_user(id).await
    }

    pub async fn set_active(&self, actor: &User, id: i32, active: bool) -> DomainResult<User> {
        require_role(actor, &[UserRole::Admin])?;
        if actor.id == id && !active {
            return Err(DomainError::Conflict(
                "Administratoren können sich nicht selbst deaktivieren".into(),
            ));
        }
        self.get_user(id).await?;
        self.repos.users().set_active(id, active).await?;
        info!(actor_id = actor.id, user_id = id, active, "User activation changed");
        self.get_user(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::geocoding::NullGeocoder;
    use crate::infrastructure::storage::InMemoryStorage;

    struct FixedGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Option<(f64, f64)> {
            Some((52.52, 13.405))
        }
    }

    fn service_with(geocoder: Arc<dyn Geocoder>) -> IdentityService {
        IdentityService::new(
            Arc::new(InMemoryStorage::new()),
            JwtConfig::new("test-secret", 1),
            geocoder,
        )
    }

    fn service() -> IdentityService {
        service_with(Arc::new(NullGeocoder))
    }

    fn registration(email: &str, role: UserRole) -> Registration {
        Registration {
            name: "Erika Mustermann".into(),
            email: email.into(),
            password: "sonnenschein".into(),
            role,
        }
    }

    #[tokio::test]
    async fn register_login_resolve() {
        let svc = service();
        let user = svc
            .register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();

        let auth = svc.authenticate("erika@example.de", "sonnenschein").await.unwrap();
        assert_eq!(auth.user.id, user.id);
        assert_eq!(auth.token_type, "Bearer");

        let resolved = svc.resolve(&auth.token).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert!(resolved.last_login_at.is_some());
    }

    #[tokio::test]
    async fn authenticate_error_kinds() {
        let svc = service();
        let user = svc
            .register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();

        assert!(matches!(
            svc.authenticate("nobody@example.de", "x").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            svc.authenticate("erika@example.de", "falsch123").await,
            Err(DomainError::Unauthorized(_))
        ));

        svc.repos.users().set_active(user.id, false).await.unwrap();
        assert!(matches!(
            svc.authenticate("erika@example.de", "sonnenschein").await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn unreadable_hash_is_internal() {
        let svc = service();
        svc.repos
            .users()
            .create(NewUser {
                name: "Altbestand".into(),
                email: "alt@example.de".into(),
                password_hash: "not-a-bcrypt-hash".into(),
                role: UserRole::Household,
            })
            .await
            .unwrap();
        assert!(matches!(
            svc.authenticate("alt@example.de", "sonnenschein").await,
            Err(DomainError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn resolve_rejects_garbage_and_deactivated() {
        let svc = service();
        assert!(matches!(
            svc.resolve("not-a-token").await,
            Err(DomainError::Unauthorized(_))
        ));

        svc.register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();
        let auth = svc.authenticate("erika@example.de", "sonnenschein").await.unwrap();
        svc.repos.users().set_active(auth.user.id, false).await.unwrap();
        assert!(matches!(
            svc.resolve(&auth.token).await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn admin_cannot_self_register() {
        let svc = service();
        assert!(matches!(
            svc.register(registration("root@example.de", UserRole::Admin)).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let svc = service();
        svc.register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();
        assert!(matches!(
            svc.register(registration("Erika@Example.de", UserRole::Installer)).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn require_role_checks_membership() {
        let svc = service();
        let user = svc
            .register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();
        assert!(require_role(&user, &[UserRole::Household, UserRole::Admin]).is_ok());
        assert!(matches!(
            require_role(&user, &[UserRole::GridOperator]),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn default_admin_only_on_empty_store() {
        let svc = service();
        let admin = svc
            .ensure_default_admin("admin@example.de", "admin12345")
            .await
            .unwrap();
        assert_eq!(admin.map(|u| u.role), Some(UserRole::Admin));
        assert!(svc
            .ensure_default_admin("admin@example.de", "admin12345")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn role_change_is_admin_only() {
        let svc = service();
        let admin = svc
            .ensure_default_admin("admin@example.de", "admin12345")
            .await
            .unwrap()
            .unwrap();
        let user = svc
            .register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();

        assert!(matches!(
            svc.change_role(&user, user.id, UserRole::GridOperator).await,
            Err(DomainError::Forbidden(_))
        ));
        let changed = svc
            .change_role(&admin, user.id, UserRole::Installer)
            .await
            .unwrap();
        assert_eq!(changed.role, UserRole::Installer);
        assert!(matches!(
            svc.set_active(&admin, admin.id, false).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn address_is_geocoded_when_possible() {
        let svc = service_with(Arc::new(FixedGeocoder));
        let user = svc
            .register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();
        let address = svc
            .set_address(
                &user,
                NewAddress {
                    street: "Unter den Linden".into(),
                    house_number: "1".into(),
                    postal_code: "10117".into(),
                    city: "Berlin".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(address.latitude, Some(52.52));

        let user = svc.get_user(user.id).await.unwrap();
        assert_eq!(svc.get_address(&user).await.unwrap(), Some(address));
    }

    #[tokio::test]
    async fn address_without_coordinates_is_kept() {
        let svc = service();
        let user = svc
            .register(registration("erika@example.de", UserRole::Household))
            .await
            .unwrap();
        let address = svc
            .set_address(
                &user,
                NewAddress {
                    street: "Feldweg".into(),
                    house_number: "3".into(),
                    postal_code: "99999".into(),
                    city: "Nirgendwo".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!((address.latitude, address.longitude), (None, None));
    }
}
