pub mod billing;
pub mod certificate;
pub mod contract;
pub mod export;
pub mod invoice;
pub mod tariff;

pub use billing::{start_billing_scheduler, BillingRunSummary, BillingService};
pub use certificate::{CertificateService, IssuedCertificate, MeasureInput};
pub use contract::{CancellationOutcome, ContractService};
pub use invoice::InvoiceService;
pub use tariff::{TariffInput, TariffService};
