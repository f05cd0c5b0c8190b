//! Domain layer
//!
//! Aggregates, state machines and repository interfaces. Nothing here
//! touches the database or HTTP.

pub mod certificate;
pub mod contract;
pub mod error;
pub mod grid;
pub mod installation;
pub mod invoice;
pub mod repositories;
pub mod tariff;
pub mod user;

pub use certificate::{CertificateStatus, EfficiencyMeasure, EnergyCertificate};
pub use contract::{CancellationAction, CancellationRequest, Contract, ContractStatus};
pub use error::{DomainError, DomainResult};
pub use grid::{check_grid_compatibility, GridInputs, MountingSystem, Orientation, ShadingClass};
pub use installation::{InstallationRequest, Offer, ProcessStatus};
pub use invoice::{Invoice, InvoiceCategory, PaymentStatus};
pub use repositories::RepositoryProvider;
pub use tariff::Tariff;
pub use user::{Address, User, UserRole};
