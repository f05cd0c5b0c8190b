//! Installation request aggregate
//!
//! The PV workflow state machine and the offer record.

pub mod model;
pub mod repository;

pub use model::{InstallationRequest, Offer, OfferDetails, PlanDetails, ProcessStatus};
pub use repository::InstallationRepository;
