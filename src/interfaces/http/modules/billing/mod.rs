//! Manual trigger of the yearly billing cycle

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
