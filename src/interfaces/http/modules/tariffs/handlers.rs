//! Tariff REST API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    AnnualChargeQuery, AnnualChargeResponse, SetTariffActiveRequest, TariffRequest,
    TariffResponse,
};
use crate::domain::User;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::auth::MessageResponse;
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/tariffs",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active tariffs", body = ApiResponse<Vec<TariffResponse>>)
    )
)]
pub async fn list_tariffs(State(state): State<AppState>) -> ApiResult<Vec<TariffResponse>> {
    let tariffs = state.tariffs.list_active().await.map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        tariffs.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tariffs/mine",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tariffs of the calling grid operator, active or not", body = ApiResponse<Vec<TariffResponse>>),
        (status = 403, description = "Grid operators only")
    )
)]
pub async fn list_own_tariffs(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<TariffResponse>> {
    let tariffs = state
        .tariffs
        .list_own(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        tariffs.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tariffs/{id}",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tariff ID")),
    responses(
        (status = 200, description = "Tariff details", body = ApiResponse<TariffResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_tariff(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<TariffResponse> {
    let tariff = state.tariffs.get(id).await.map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(tariff.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/tariffs/{id}/annual-charge",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tariff ID"), AnnualChargeQuery),
    responses(
        (status = 200, description = "Yearly charge for the given consumption", body = ApiResponse<AnnualChargeResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn annual_charge(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<AnnualChargeQuery>,
) -> ApiResult<AnnualChargeResponse> {
    let tariff = state.tariffs.get(id).await.map_err(|e| state.fail(e))?;
    let consumption_kwh = query
        .consumption_kwh
        .unwrap_or(state.annual_consumption_kwh);
    Ok(Json(ApiResponse::success(AnnualChargeResponse {
        tariff_id: tariff.id,
        consumption_kwh,
        annual_charge_cents: tariff.annual_charge_cents(consumption_kwh),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/tariffs",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    request_body = TariffRequest,
    responses(
        (status = 201, description = "Tariff created", body = ApiResponse<TariffResponse>),
        (status = 400, description = "Negative price or zero term"),
        (status = 403, description = "Grid operators only"),
        (status = 409, description = "Tariff name already taken")
    )
)]
pub async fn create_tariff(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<TariffRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TariffResponse>>), ApiError> {
    let tariff = state
        .tariffs
        .create(&user, request.into())
        .await
        .map_err(|e| state.fail(e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tariff.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/tariffs/{id}",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tariff ID")),
    request_body = TariffRequest,
    responses(
        (status = 200, description = "Tariff updated", body = ApiResponse<TariffResponse>),
        (status = 403, description = "Not the owning operator"),
        (status = 409, description = "Referenced by an open contract, or name taken")
    )
)]
pub async fn update_tariff(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<TariffRequest>,
) -> ApiResult<TariffResponse> {
    let tariff = state
        .tariffs
        .update(&user, id, request.into())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(tariff.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/tariffs/{id}/active",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tariff ID")),
    request_body = SetTariffActiveRequest,
    responses(
        (status = 200, description = "Tariff (de)activated", body = ApiResponse<TariffResponse>),
        (status = 409, description = "Referenced by an open contract")
    )
)]
pub async fn set_tariff_active(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<SetTariffActiveRequest>,
) -> ApiResult<TariffResponse> {
    let tariff = state
        .tariffs
        .set_active(&user, id, request.is_active)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(tariff.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tariffs/{id}",
    tag = "Tariffs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tariff ID")),
    responses(
        (status = 200, description = "Tariff deleted", body = ApiResponse<MessageResponse>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Referenced by an open contract")
    )
)]
pub async fn delete_tariff(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<MessageResponse> {
    state
        .tariffs
        .delete(&user, id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Tarif {} gelöscht", id),
    })))
}
