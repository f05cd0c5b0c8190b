//! PV installation requests: offers, planning, grid check and feed-in

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
