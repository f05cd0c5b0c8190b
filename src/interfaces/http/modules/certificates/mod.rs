//! Energy certificates (Energieausweis)

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
