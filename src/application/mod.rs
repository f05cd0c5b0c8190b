//! Application layer: use cases over the domain and its ports

pub mod identity;
pub mod installation;
pub mod ports;
pub mod services;

pub use identity::IdentityService;
pub use installation::InstallationService;
pub use services::{
    BillingService, CertificateService, ContractService, InvoiceService, TariffService,
};
