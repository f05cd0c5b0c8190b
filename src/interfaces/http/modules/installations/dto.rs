//! Installation request DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::installation::{OfferDetails, PlanDetails};
use crate::domain::{DomainError, DomainResult, InstallationRequest, Offer};

/// Installation request as seen by its participants
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstallationResponse {
    pub id: i32,
    pub household_id: i32,
    pub installer_id: Option<i32>,
    pub grid_operator_id: Option<i32>,
    pub certificate_id: Option<i32>,
    /// ProcessStatus, e.g. `OfferMade`
    pub status: String,
    /// `null` until the grid operator has checked the plan
    pub grid_compatible: Option<bool>,
    pub module_type: Option<String>,
    pub capacity_kw: Option<f64>,
    pub area_m2: Option<f64>,
    pub mounting_system: Option<String>,
    pub shading: Option<String>,
    pub orientation: Option<String>,
    pub inclination_deg: Option<f64>,
    pub offer_cost_cents: Option<i64>,
    pub notes: Option<String>,
    pub feed_in_granted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InstallationRequest> for InstallationResponse {
    fn from(r: InstallationRequest) -> Self {
        Self {
            id: r.id,
            household_id: r.household_id,
            installer_id: r.installer_id,
            grid_operator_id: r.grid_operator_id,
            certificate_id: r.certificate_id,
            status: r.status.to_string(),
            grid_compatible: r.grid_compatible,
            module_type: r.module_type,
            capacity_kw: r.capacity_kw,
            area_m2: r.area_m2,
            mounting_system: r.mounting_system.map(|m| m.to_string()),
            shading: r.shading.map(|s| s.to_string()),
            orientation: r.orientation.map(|o| o.to_string()),
            inclination_deg: r.inclination_deg,
            offer_cost_cents: r.offer_cost_cents,
            notes: r.notes,
            feed_in_granted_at: r.feed_in_granted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfferResponse {
    pub id: i32,
    pub request_id: i32,
    pub installer_id: i32,
    pub cost_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Offer> for OfferResponse {
    fn from(o: Offer) -> Self {
        Self {
            id: o.id,
            request_id: o.request_id,
            installer_id: o.installer_id,
            cost_cents: o.cost_cents,
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateInstallationRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MakeOfferRequest {
    pub cost_cents: i64,
    #[validate(length(min = 1, max = 100, message = "Modultyp ist erforderlich"))]
    pub module_type: String,
    pub capacity_kw: f64,
}

impl From<MakeOfferRequest> for OfferDetails {
    fn from(r: MakeOfferRequest) -> Self {
        Self {
            cost_cents: r.cost_cents,
            module_type: r.module_type,
            capacity_kw: r.capacity_kw,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitPlanRequest {
    pub capacity_kw: f64,
    pub area_m2: f64,
    /// Aufdachmontage | Indachmontage | Flachdachmontage | Freiflächenmontage
    pub mounting_system: String,
    /// NoShade | MinimalShade | ModerateShade | HeavyShade
    pub shading: String,
    /// N | NE | E | SE | S | SW | W | NW
    pub orientation: Option<String>,
    pub inclination_deg: Option<f64>,
}

impl SubmitPlanRequest {
    /// Parses the enumerated fields; unknown values are a bad request.
    pub fn into_plan(self) -> DomainResult<PlanDetails> {
        let orientation = self
            .orientation
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(DomainError::BadRequest)?;
        Ok(PlanDetails {
            capacity_kw: self.capacity_kw,
            area_m2: self.area_m2,
            mounting_system: self.mounting_system.parse().map_err(DomainError::BadRequest)?,
            shading: self.shading.parse().map_err(DomainError::BadRequest)?,
            orientation,
            inclination_deg: self.inclination_deg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MountingSystem, Orientation};

    fn plan(mounting: &str, orientation: Option<&str>) -> SubmitPlanRequest {
        SubmitPlanRequest {
            capacity_kw: 9.8,
            area_m2: 52.0,
            mounting_system: mounting.to_string(),
            shading: "NoShade".to_string(),
            orientation: orientation.map(String::from),
            inclination_deg: Some(30.0),
        }
    }

    #[test]
    fn german_mounting_names_parse() {
        let p = plan("Indachmontage", Some("SW")).into_plan().unwrap();
        assert_eq!(p.mounting_system, MountingSystem::InRoofMounting);
        assert_eq!(p.orientation, Some(Orientation::SW));
    }

    #[test]
    fn unknown_enum_value_is_bad_request() {
        assert!(matches!(
            plan("Carport", None).into_plan(),
            Err(DomainError::BadRequest(_))
        ));
        assert!(matches!(
            plan("Aufdachmontage", Some("Up")).into_plan(),
            Err(DomainError::BadRequest(_))
        ));
    }
}
