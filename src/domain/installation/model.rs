//! PV installation request aggregate
//!
//! The request is filled in stage by stage. Each transition method checks
//! the caller and the current [`ProcessStatus`] before touching any field,
//! so a rejected call leaves the record exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::grid::{GridInputs, MountingSystem, Orientation, ShadingClass};
use crate::domain::{DomainError, DomainResult};

/// Workflow state of an installation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    Requested,
    OfferMade,
    OfferAccepted,
    OfferRejected,
    DataRequested,
    DataReleased,
    PlanCreated,
    Approved,
    FeedInGranted,
    AusweisRequested,
    AusweisIssued,
    Accepted,
}

impl ProcessStatus {
    pub const ALL: [ProcessStatus; 12] = [
        Self::Requested,
        Self::OfferMade,
        Self::OfferAccepted,
        Self::OfferRejected,
        Self::DataRequested,
        Self::DataReleased,
        Self::PlanCreated,
        Self::Approved,
        Self::FeedInGranted,
        Self::AusweisRequested,
        Self::AusweisIssued,
        Self::Accepted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::OfferMade => "OfferMade",
            Self::OfferAccepted => "OfferAccepted",
            Self::OfferRejected => "OfferRejected",
            Self::DataRequested => "DataRequested",
            Self::DataReleased => "DataReleased",
            Self::PlanCreated => "PlanCreated",
            Self::Approved => "Approved",
            Self::FeedInGranted => "FeedInGranted",
            Self::AusweisRequested => "AusweisRequested",
            Self::AusweisIssued => "AusweisIssued",
            Self::Accepted => "Accepted",
        }
    }

    /// No further transition leaves these states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::OfferRejected | Self::Accepted)
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("unknown process status '{}'", s))
    }
}

/// Offer data entered by the installer.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferDetails {
    pub cost_cents: i64,
    pub module_type: String,
    pub capacity_kw: f64,
}

/// Installation plan entered by the installer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDetails {
    pub capacity_kw: f64,
    pub area_m2: f64,
    pub mounting_system: MountingSystem,
    pub shading: ShadingClass,
    pub orientation: Option<Orientation>,
    pub inclination_deg: Option<f64>,
}

/// PV installation request.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationRequest {
    pub id: i32,
    pub household_id: i32,
    pub installer_id: Option<i32>,
    pub grid_operator_id: Option<i32>,
    pub certificate_id: Option<i32>,
    pub status: ProcessStatus,
    /// `None` until the grid operator has run the check.
    pub grid_compatible: Option<bool>,
    pub module_type: Option<String>,
    pub capacity_kw: Option<f64>,
    pub area_m2: Option<f64>,
    pub mounting_system: Option<MountingSystem>,
    pub shading: Option<ShadingClass>,
    pub orientation: Option<Orientation>,
    pub inclination_deg: Option<f64>,
    pub offer_cost_cents: Option<i64>,
    pub notes: Option<String>,
    pub feed_in_granted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InstallationRequest {
    pub fn new(household_id: i32, notes: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            household_id,
            installer_id: None,
            grid_operator_id: None,
            certificate_id: None,
            status: ProcessStatus::Requested,
            grid_compatible: None,
            module_type: None,
            capacity_kw: None,
            area_m2: None,
            mounting_system: None,
            shading: None,
            orientation: None,
            inclination_deg: None,
            offer_cost_cents: None,
            notes,
            feed_in_granted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn grid_inputs(&self) -> GridInputs {
        GridInputs {
            capacity_kw: self.capacity_kw,
            area_m2: self.area_m2,
            mounting_system: self.mounting_system,
            shading: self.shading,
        }
    }

    pub fn is_participant(&self, user_id: i32) -> bool {
        self.household_id == user_id
            || self.installer_id == Some(user_id)
            || self.grid_operator_id == Some(user_id)
    }

    fn expect_status(&self, expected: &[ProcessStatus]) -> DomainResult<()> {
        if expected.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::wrong_status(&self.status, expected))
        }
    }

    fn expect_owner(&self, household_id: i32) -> DomainResult<()> {
        if self.household_id == household_id {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "Anfrage {} gehört einem anderen Haushalt",
                self.id
            )))
        }
    }

    fn expect_installer(&self, installer_id: i32) -> DomainResult<()> {
        if self.installer_id == Some(installer_id) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "Anfrage {} ist einem anderen Solarteur zugewiesen",
                self.id
            )))
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn make_offer(&mut self, installer_id: i32, offer: &OfferDetails) -> DomainResult<()> {
        if let Some(assigned) = self.installer_id {
            if assigned != installer_id {
                return Err(DomainError::Forbidden(format!(
                    "Anfrage {} ist einem anderen Solarteur zugewiesen",
                    self.id
                )));
            }
        }
        self.expect_status(&[ProcessStatus::Requested])?;
        if offer.cost_cents <= 0 {
            return Err(DomainError::BadRequest("cost must be positive".into()));
        }

        self.installer_id = Some(installer_id);
        self.offer_cost_cents = Some(offer.cost_cents);
        self.module_type = Some(offer.module_type.clone());
        self.capacity_kw = Some(offer.capacity_kw);
        self.status = ProcessStatus::OfferMade;
        self.touch();
        Ok(())
    }

    pub fn accept_offer(&mut self, household_id: i32) -> DomainResult<()> {
        self.expect_owner(household_id)?;
        self.expect_status(&[ProcessStatus::OfferMade])?;
        self.status = ProcessStatus::OfferAccepted;
        self.touch();
        Ok(())
    }

    pub fn reject_offer(&mut self, household_id: i32) -> DomainResult<()> {
        self.expect_owner(household_id)?;
        self.expect_status(&[ProcessStatus::OfferMade])?;
        self.status = ProcessStatus::OfferRejected;
        self.touch();
        Ok(())
    }

    pub fn request_data(&mut self, installer_id: i32) -> DomainResult<()> {
        self.expect_installer(installer_id)?;
        self.expect_status(&[ProcessStatus::OfferAccepted])?;
        self.status = ProcessStatus::DataRequested;
        self.touch();
        Ok(())
    }

    pub fn release_data(&mut self, household_id: i32) -> DomainResult<()> {
        self.expect_owner(household_id)?;
        self.expect_status(&[ProcessStatus::DataRequested])?;
        self.status = ProcessStatus::DataReleased;
        self.touch();
        Ok(())
    }

    /// Stores the plan. Re-submitting a plan clears a previous check result.
    pub fn submit_plan(&mut self, installer_id: i32, plan: &PlanDetails) -> DomainResult<()> {
        self.expect_installer(installer_id)?;
        self.expect_status(&[
            ProcessStatus::OfferAccepted,
            ProcessStatus::DataRequested,
            ProcessStatus::DataReleased,
            ProcessStatus::PlanCreated,
        ])?;
        if plan.capacity_kw <= 0.0 || plan.area_m2 <= 0.0 {
            return Err(DomainError::BadRequest(
                "capacity and area must be positive".into(),
            ));
        }

        self.capacity_kw = Some(plan.capacity_kw);
        self.area_m2 = Some(plan.area_m2);
        self.mounting_system = Some(plan.mounting_system);
        self.shading = Some(plan.shading);
        self.orientation = plan.orientation;
        self.inclination_deg = plan.inclination_deg;
        self.grid_compatible = None;
        self.status = ProcessStatus::PlanCreated;
        self.touch();
        Ok(())
    }

    /// Records the compatibility verdict. Never changes the status.
    pub fn record_compatibility(&mut self, compatible: bool) -> DomainResult<()> {
        self.expect_status(&[ProcessStatus::PlanCreated])?;
        self.grid_compatible = Some(compatible);
        self.touch();
        Ok(())
    }

    /// Approval and feed-in grant happen together; the request ends up in
    /// `FeedInGranted` with the calling operator assigned.
    pub fn grant_feed_in(&mut self, operator_id: i32) -> DomainResult<()> {
        self.expect_status(&[ProcessStatus::PlanCreated, ProcessStatus::Approved])?;
        if self.grid_compatible != Some(true) {
            return Err(DomainError::Precondition(format!(
                "Anfrage {} ist nicht als netzverträglich geprüft",
                self.id
            )));
        }
        self.grid_operator_id = Some(operator_id);
        self.status = ProcessStatus::FeedInGranted;
        self.feed_in_granted_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    pub fn confirm_acceptance(&mut self) -> DomainResult<()> {
        self.expect_status(&[
            ProcessStatus::FeedInGranted,
            ProcessStatus::AusweisRequested,
            ProcessStatus::AusweisIssued,
        ])?;
        self.status = ProcessStatus::Accepted;
        self.touch();
        Ok(())
    }

    /// Fan-out target of a certificate request. Returns whether the
    /// request moved.
    pub fn mark_certificate_requested(&mut self, certificate_id: i32) -> bool {
        if self.status.is_terminal() || self.status == ProcessStatus::AusweisIssued {
            return false;
        }
        self.status = ProcessStatus::AusweisRequested;
        self.certificate_id = Some(certificate_id);
        self.touch();
        true
    }

    /// Fan-out target of a certificate issuance. Returns whether the
    /// request moved.
    pub fn mark_certificate_issued(&mut self, certificate_id: i32) -> bool {
        if self.status != ProcessStatus::AusweisRequested {
            return false;
        }
        self.status = ProcessStatus::AusweisIssued;
        self.certificate_id = Some(certificate_id);
        self.touch();
        true
    }
}

/// Offer submitted for a request; one per request.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: i32,
    pub request_id: i32,
    pub installer_id: i32,
    pub cost_cents: i64,
    pub created_at: DateTime<Utc>,
}
