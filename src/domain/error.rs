//! Domain errors

use thiserror::Error;

/// Domain-level error taxonomy shared by every service.
///
/// Each variant maps onto one HTTP status in the interface layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Missing, malformed or expired credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credential, wrong role or not a participant
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Uniqueness or state conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Workflow action attempted in the wrong state
    #[error("Precondition failed: status is {current}, expected {expected}")]
    PreconditionFailed { current: String, expected: String },

    /// Workflow precondition other than status (e.g. incomplete fields)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    /// Status precondition failure listing every accepted status.
    pub fn wrong_status<S: std::fmt::Display>(current: &S, expected: &[S]) -> Self {
        Self::PreconditionFailed {
            current: current.to_string(),
            expected: expected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
