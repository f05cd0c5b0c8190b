//! Invoices: listing, payment and CSV export

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
