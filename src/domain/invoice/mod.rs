//! Invoice aggregate and billing calendar

pub mod calendar;
pub mod model;
pub mod repository;

pub use model::{Invoice, InvoiceCategory, PaymentStatus};
pub use repository::{InvoiceRepository, PeriodKey};
