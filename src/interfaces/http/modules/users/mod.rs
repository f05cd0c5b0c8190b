//! User administration and the caller's postal address

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
