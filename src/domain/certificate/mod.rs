//! Energy certificate aggregate

pub mod model;
pub mod repository;

pub use model::{CertificateStatus, EfficiencyMeasure, EnergyCertificate};
pub use repository::CertificateRepository;
