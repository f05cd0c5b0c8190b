//! PV installation workflow

pub mod service;

pub use service::InstallationService;
