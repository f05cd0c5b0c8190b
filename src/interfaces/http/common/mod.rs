//! Shared HTTP building blocks: response envelope, error mapping, extractors

mod validated_json;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;
use crate::shared::PaginatedResult;

/// Response envelope used by every REST endpoint.
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// One page of a list plus its position.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn from_result<U: Into<T>>(result: PaginatedResult<U>) -> Self {
        Self {
            items: result.items.into_iter().map(Into::into).collect(),
            total: result.total,
            page: result.page,
            limit: result.limit,
            total_pages: result.total_pages,
        }
    }
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Result type returned by JSON handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Message shown to clients for internal failures outside development mode.
pub const GENERIC_INTERNAL_MESSAGE: &str =
    "Ein interner Fehler ist aufgetreten. Bitte versuchen Sie es später erneut.";

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::PreconditionFailed { .. } | DomainError::Precondition(_) => {
            StatusCode::PRECONDITION_FAILED
        }
        DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
        DomainError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Converts a domain error into the JSON error response.
///
/// Internal details are logged and only echoed when `dev_mode` is set.
pub fn domain_error(error: DomainError, dev_mode: bool) -> ApiError {
    let status = status_for(&error);
    let message = match &error {
        DomainError::Internal(detail) => {
            tracing::error!(error = %detail, "Internal error while handling request");
            if dev_mode {
                error.to_string()
            } else {
                GENERIC_INTERNAL_MESSAGE.to_string()
            }
        }
        _ => error.to_string(),
    };
    (status, Json(ApiResponse::error(message)))
}
