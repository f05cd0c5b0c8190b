//! User DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::Address;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Filter by role (e.g. `household`)
    pub role: Option<String>,
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Page size (1-100)
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetAddressRequest {
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(min = 1, max = 20))]
    pub house_number: String,
    #[validate(length(min = 4, max = 10))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressDto {
    pub id: i32,
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<Address> for AddressDto {
    fn from(a: Address) -> Self {
        Self {
            id: a.id,
            street: a.street,
            house_number: a.house_number,
            postal_code: a.postal_code,
            city: a.city,
            latitude: a.latitude,
            longitude: a.longitude,
        }
    }
}
