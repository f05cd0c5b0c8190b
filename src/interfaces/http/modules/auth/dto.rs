//! Authentication DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::User;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255, message = "E-Mail ist erforderlich"))]
    pub email: String,
    #[validate(length(min = 1, message = "Passwort ist erforderlich"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// household | installer | energy_consultant | grid_operator | admin
    pub role: String,
    pub is_active: bool,
    pub address_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role.to_string(),
            is_active: u.is_active,
            address_id: u.address_id,
            created_at: u.created_at,
            last_login_at: u.last_login_at,
        }
    }
}

/// Self-registration. `role` is parsed by the handler, an unknown value is a 400.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name ist erforderlich"))]
    pub name: String,
    #[validate(email(message = "ungültige E-Mail-Adresse"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Passwort muss 8 bis 128 Zeichen haben"))]
    pub password: String,
    /// household | installer | energy_consultant | grid_operator
    pub role: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "aktuelles Passwort ist erforderlich"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "neues Passwort muss 8 bis 128 Zeichen haben"))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
