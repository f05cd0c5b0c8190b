//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace role. Exactly one per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Household,
    Installer,
    EnergyConsultant,
    GridOperator,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        UserRole::Household,
        UserRole::Installer,
        UserRole::EnergyConsultant,
        UserRole::GridOperator,
        UserRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Household => "household",
            Self::Installer => "installer",
            Self::EnergyConsultant => "energy_consultant",
            Self::GridOperator => "grid_operator",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "household" => Ok(Self::Household),
            "installer" => Ok(Self::Installer),
            "energy_consultant" => Ok(Self::EnergyConsultant),
            "grid_operator" => Ok(Self::GridOperator),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// User model
#[derive(Clone, Debug)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    /// Addresses may be shared between users.
    pub address_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Postal address, optionally geocoded.
#[derive(Clone, Debug, PartialEq)]
pub struct Address {
    pub id: i32,
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Address {
    /// Single-line form handed to the geocoder.
    pub fn one_line(&self) -> String {
        format!(
            "{} {}, {} {}",
            self.street, self.house_number, self.postal_code, self.city
        )
    }
}

/// Input for creating a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn address_one_line() {
        let a = Address {
            id: 1,
            street: "Hauptstraße".into(),
            house_number: "5a".into(),
            postal_code: "10115".into(),
            city: "Berlin".into(),
            latitude: None,
            longitude: None,
        };
        assert_eq!(a.one_line(), "Hauptstraße 5a, 10115 Berlin");
    }
}
