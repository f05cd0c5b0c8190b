//! SeaORM entities, one module per table

pub mod address;
pub mod cancellation_request;
pub mod certificate;
pub mod contract;
pub mod efficiency_measure;
pub mod installation_request;
pub mod invoice;
pub mod offer;
pub mod tariff;
pub mod user;
