//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod certificate_repository;
pub mod contract_repository;
pub mod installation_repository;
pub mod invoice_repository;
pub mod repository_provider;
pub mod tariff_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use std::fmt::Display;
use std::str::FromStr;

use sea_orm::{DbErr, SqlErr};

use crate::domain::{DomainError, DomainResult};

fn db_err(e: DbErr) -> DomainError {
    log::error!("Database error: {}", e);
    DomainError::Internal(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Maps a unique-index violation to `Conflict`, anything else to `Internal`.
fn conflict_or_db_err(e: DbErr, message: impl FnOnce() -> String) -> DomainError {
    if is_unique_violation(&e) {
        DomainError::Conflict(message())
    } else {
        db_err(e)
    }
}

/// Parses an enum stored in its string form.
fn parse_column<T>(column: &str, value: &str) -> DomainResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| DomainError::Internal(format!("Corrupt {} column: {}", column, e)))
}

fn parse_optional<T>(column: &str, value: Option<String>) -> DomainResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|v| parse_column(column, &v)).transpose()
}
