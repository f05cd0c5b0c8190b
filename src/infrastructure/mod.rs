//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod geocoding;
pub mod notifications;
pub mod storage;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use geocoding::NullGeocoder;
pub use notifications::LogNotifier;
pub use storage::InMemoryStorage;
