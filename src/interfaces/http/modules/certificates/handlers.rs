//! Energy certificate handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use super::dto::{
    AdditionalDataRequest, CertificateResponse, IssuedCertificateResponse, MeasureResponse,
};
use crate::domain::User;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/certificates",
    tag = "Certificates",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Certificate requested; linked installation requests move to AusweisRequested", body = ApiResponse<CertificateResponse>),
        (status = 403, description = "Households only"),
        (status = 412, description = "Household has no installation request")
    )
)]
pub async fn request_certificate(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<(StatusCode, Json<ApiResponse<CertificateResponse>>), ApiError> {
    let certificate = state
        .certificates
        .request(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(certificate.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates",
    tag = "Certificates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Household: own certificates. Consultant: open requests", body = ApiResponse<Vec<CertificateResponse>>)
    )
)]
pub async fn list_certificates(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<CertificateResponse>> {
    let certificates = state
        .certificates
        .list(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        certificates.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/{id}",
    tag = "Certificates",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate", body = ApiResponse<CertificateResponse>),
        (status = 403, description = "Not the owning household"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<CertificateResponse> {
    let certificate = state
        .certificates
        .get(&user, id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(certificate.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/{id}/measure",
    tag = "Certificates",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Efficiency measure, null if none was entered", body = ApiResponse<Option<MeasureResponse>>)
    )
)]
pub async fn get_measure(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<Option<MeasureResponse>> {
    let measure = state
        .certificates
        .get_measure(&user, id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(measure.map(Into::into))))
}

#[utoipa::path(
    post,
    path = "/api/v1/certificates/{id}/additional-data",
    tag = "Certificates",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Certificate ID")),
    request_body = AdditionalDataRequest,
    responses(
        (status = 200, description = "Measure stored, status AdditionalDataEntered", body = ApiResponse<CertificateResponse>),
        (status = 403, description = "Consultants only"),
        (status = 412, description = "Certificate is not in status Requested")
    )
)]
pub async fn enter_additional_data(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<AdditionalDataRequest>,
) -> ApiResult<CertificateResponse> {
    let certificate = state
        .certificates
        .enter_additional_data(&user, id, request.into())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(certificate.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/certificates/{id}/issue",
    tag = "Certificates",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate issued, valid for ten years", body = ApiResponse<IssuedCertificateResponse>),
        (status = 403, description = "Consultants only, or assigned to another consultant"),
        (status = 412, description = "Certificate cannot be issued in its current state")
    )
)]
pub async fn issue_certificate(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<IssuedCertificateResponse> {
    let today = Utc::now().date_naive();
    let issued = state
        .certificates
        .issue(&user, id, today)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(issued.into())))
}
