//! Installation workflow handlers
//!
//! Each transition endpoint returns the updated request. Role and status
//! checks live in `InstallationService`; a refused transition leaves the
//! stored request untouched.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    CreateInstallationRequest, InstallationResponse, MakeOfferRequest, OfferResponse,
    SubmitPlanRequest,
};
use crate::domain::{DomainResult, InstallationRequest, User};
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::router::AppState;

fn respond(
    state: &AppState,
    result: DomainResult<InstallationRequest>,
) -> ApiResult<InstallationResponse> {
    result
        .map(|r| Json(ApiResponse::success(r.into())))
        .map_err(|e| state.fail(e))
}

#[utoipa::path(
    post,
    path = "/api/v1/installations",
    tag = "Installations",
    security(("bearer_auth" = [])),
    request_body = CreateInstallationRequest,
    responses(
        (status = 201, description = "Request created with status Requested", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Households only")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<CreateInstallationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InstallationResponse>>), ApiError> {
    let created = state
        .installations
        .create_request(&user, request.notes)
        .await
        .map_err(|e| state.fail(e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/installations",
    tag = "Installations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests visible to the caller's role", body = ApiResponse<Vec<InstallationResponse>>)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Vec<InstallationResponse>> {
    let requests = state
        .installations
        .list(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(
        requests.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/installations/{id}",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Installation request", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.get(&user, id).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/installations/{id}/offer",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Offer of the request", body = ApiResponse<OfferResponse>),
        (status = 404, description = "No offer yet")
    )
)]
pub async fn get_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<OfferResponse> {
    let offer = state
        .installations
        .get_offer(&user, id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(offer.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/offer",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    request_body = MakeOfferRequest,
    responses(
        (status = 200, description = "Offer made", body = ApiResponse<InstallationResponse>),
        (status = 400, description = "Non-positive cost"),
        (status = 403, description = "Installers only, or assigned to another installer"),
        (status = 412, description = "Request is not in status Requested")
    )
)]
pub async fn make_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<MakeOfferRequest>,
) -> ApiResult<InstallationResponse> {
    respond(
        &state,
        state.installations.make_offer(&user, id, request.into()).await,
    )
}

#[utoipa::path(
    put,
    path = "/api/v1/installations/{id}/plan",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    request_body = SubmitPlanRequest,
    responses(
        (status = 200, description = "Plan stored, status PlanCreated", body = ApiResponse<InstallationResponse>),
        (status = 400, description = "Unknown enumeration value or non-positive size"),
        (status = 412, description = "Offer not accepted yet")
    )
)]
pub async fn submit_plan(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<SubmitPlanRequest>,
) -> ApiResult<InstallationResponse> {
    let plan = request.into_plan().map_err(|e| state.fail(e))?;
    respond(&state, state.installations.submit_plan(&user, id, plan).await)
}

/// Household accepts the offer; creates the installer invoice
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/accept",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Offer accepted", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 412, description = "Status must be OfferMade")
    )
)]
pub async fn accept_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.accept_offer(&user, id).await)
}

/// Household rejects the offer
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/reject",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Offer rejected", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 412, description = "Status must be OfferMade")
    )
)]
pub async fn reject_offer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.reject_offer(&user, id).await)
}

/// Installer asks the household for building data
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/request-data",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Data requested", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 412, description = "Status must be OfferAccepted")
    )
)]
pub async fn request_data(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.request_data(&user, id).await)
}

/// Household releases the requested data
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/release-data",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Data released", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 412, description = "Status must be DataRequested")
    )
)]
pub async fn release_data(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.release_data(&user, id).await)
}

/// Grid operator evaluates the plan against the grid limits
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/compatibility-check",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Check result stored in grid_compatible", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 501, description = "Plan fields missing"),
        (status = 412, description = "Status must be PlanCreated")
    )
)]
pub async fn check_compatibility(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.check_compatibility(&user, id).await)
}

/// Grid operator grants feed-in for a compatible plan
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/feed-in",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Feed-in granted", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 412, description = "Status must be PlanCreated or Approved, compatible")
    )
)]
pub async fn grant_feed_in(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.grant_feed_in(&user, id).await)
}

/// Final acceptance of the installation
#[utoipa::path(
    post,
    path = "/api/v1/installations/{id}/confirm-acceptance",
    tag = "Installations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Installation request ID")),
    responses(
        (status = 200, description = "Installation accepted", body = ApiResponse<InstallationResponse>),
        (status = 403, description = "Wrong role or not a participant"),
        (status = 412, description = "Status must be FeedInGranted, AusweisRequested or AusweisIssued")
    )
)]
pub async fn confirm_acceptance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<InstallationResponse> {
    respond(&state, state.installations.confirm_acceptance(&user, id).await)
}
