//! Supply contracts and their cancellation

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
