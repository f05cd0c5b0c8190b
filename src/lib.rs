//! # Solar Market
//!
//! Marketplace backend connecting households with PV installers, energy
//! consultants and grid operators.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Aggregates, state machines and repository traits
//! - **application**: Use cases (identity, installation workflow, tariffs,
//!   contracts, billing, certificates, invoices)
//! - **infrastructure**: SeaORM database, in-memory storage, crypto and
//!   outbound adapters
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Shutdown coordination and pagination

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::create_api_router;
