//! Contract and cancellation handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use super::dto::{
    CancellationOutcomeResponse, CancellationResponse, ContractResponse, CreateContractRequest,
    RequestCancellationRequest, ResolveCancellationRequest,
};
use crate::domain::User;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult};
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/contracts",
    tag = "Contracts",
    security(("bearer_auth" = [])),
    request_body = CreateContractRequest,
    responses(
        (status = 201, description = "Contract started today", body = ApiResponse<ContractResponse>),
        (status = 403, description = "Households only"),
        (status = 404, description = "Unknown tariff"),
        (status = 409, description = "Open contract for this tariff already exists"),
        (status = 412, description = "Tariff is not active")
    )
)]
pub async fn create_contract(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContractResponse>>), ApiError> {
    let today = Utc::now().date_naive();
    let contract = state
        .contracts
        .create(&user, request.tariff_id, today)
        .await
        .map_err(|e| state.fail(e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(contract.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts",
    tag = "Contracts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Household: own contracts. Operator: contracts on own tariffs", body = ApiResponse<Vec<ContractResponse>>)
    )
)]
pub async fn list_contracts(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<ContractResponse>> {
    let contracts = state.contracts.list(&user).await.map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        contracts.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}",
    tag = "Contracts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract", body = ApiResponse<ContractResponse>),
        (status = 403, description = "Not a party of the contract"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_contract(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<ContractResponse> {
    let contract = state.contracts.get(&user, id).await.map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(contract.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts/{id}/cancellation",
    tag = "Contracts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Contract ID")),
    request_body = RequestCancellationRequest,
    responses(
        (status = 201, description = "Cancellation pending", body = ApiResponse<CancellationResponse>),
        (status = 409, description = "Cancellation already pending or contract cancelled")
    )
)]
pub async fn request_cancellation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<RequestCancellationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CancellationResponse>>), ApiError> {
    let cancellation = state
        .contracts
        .request_cancellation(&user, id, request.replacement_tariff_id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(cancellation.into())),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts/{id}/cancellation/resolve",
    tag = "Contracts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Contract ID")),
    request_body = ResolveCancellationRequest,
    responses(
        (status = 200, description = "Cancellation confirmed or rejected", body = ApiResponse<CancellationOutcomeResponse>),
        (status = 400, description = "Action is neither confirm nor reject"),
        (status = 403, description = "Not the operator of the contract"),
        (status = 412, description = "No pending cancellation")
    )
)]
pub async fn resolve_cancellation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<ResolveCancellationRequest>,
) -> ApiResult<CancellationOutcomeResponse> {
    let today = Utc::now().date_naive();
    let outcome = state
        .contracts
        .resolve_cancellation(&user, id, &request.action, today)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts/cancellations/pending",
    tag = "Contracts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending cancellations on the operator's contracts", body = ApiResponse<Vec<CancellationResponse>>),
        (status = 403, description = "Grid operators only")
    )
)]
pub async fn pending_cancellations(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<CancellationResponse>> {
    let pending = state
        .contracts
        .pending_cancellations(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        pending.into_iter().map(Into::into).collect(),
    )))
}
