//! Invoice handlers

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use super::dto::InvoiceResponse;
use crate::domain::User;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult};
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invoices issued to or by the caller, newest first", body = ApiResponse<Vec<InvoiceResponse>>)
    )
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<InvoiceResponse>> {
    let invoices = state.invoices.list(&user).await.map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        invoices.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = ApiResponse<InvoiceResponse>),
        (status = 403, description = "Caller is neither issuer nor recipient"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InvoiceResponse> {
    let invoice = state.invoices.get(&user, id).await.map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(invoice.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/pay",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice marked as paid", body = ApiResponse<InvoiceResponse>),
        (status = 403, description = "Caller is neither issuer nor recipient"),
        (status = 409, description = "Already paid")
    )
)]
pub async fn pay_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InvoiceResponse> {
    let invoice = state
        .invoices
        .mark_paid(&user, id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(invoice.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/export",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Semicolon separated CSV of the caller's invoices", content_type = "text/csv", body = String)
    )
)]
pub async fn export_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state
        .invoices
        .export_csv(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"rechnungen.csv\"",
            ),
        ],
        csv,
    ))
}
