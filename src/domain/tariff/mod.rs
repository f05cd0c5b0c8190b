//! Tariff aggregate

pub mod model;
pub mod repository;

pub use model::Tariff;
pub use repository::TariffRepository;
