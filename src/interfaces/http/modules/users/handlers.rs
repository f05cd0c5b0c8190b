//! User management handlers (admin) and the caller's own address

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::dto::{AddressDto, ChangeRoleRequest, ListUsersQuery, SetActiveRequest, SetAddressRequest};
use crate::application::identity::NewAddress;
use crate::domain::{DomainError, User, UserRole};
use crate::interfaces::http::common::{
    ApiError, ApiResponse, ApiResult, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::modules::auth::UserInfo;
use crate::interfaces::http::router::AppState;
use crate::shared::validate_pagination;

fn parse_role(state: &AppState, raw: &str) -> Result<UserRole, ApiError> {
    raw.parse()
        .map_err(|e: String| state.fail(DomainError::BadRequest(e)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersQuery),
    responses(
        (status = 200, description = "User page", body = ApiResponse<PaginatedResponse<UserInfo>>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ListUsersQuery>,
) -> ApiResult<PaginatedResponse<UserInfo>> {
    let role = match params.role.as_deref() {
        Some(raw) => Some(parse_role(&state, raw)?),
        None => None,
    };
    let (page, limit) = validate_pagination(params.page, params.limit);

    let result = state
        .identity
        .list_users(&user, role, page, limit)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(result))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserInfo>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> ApiResult<UserInfo> {
    let found = state
        .identity
        .admin_get_user(&user, id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(found.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserInfo>),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Admins cannot demote themselves")
    )
)]
pub async fn change_role(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<ChangeRoleRequest>,
) -> ApiResult<UserInfo> {
    let role = parse_role(&state, &request.role)?;
    let updated = state
        .identity
        .change_role(&user, id, role)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(updated.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/active",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Account (de)activated", body = ApiResponse<UserInfo>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Admins cannot deactivate themselves")
    )
)]
pub async fn set_active(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<UserInfo> {
    let updated = state
        .identity
        .set_active(&user, id, request.is_active)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(updated.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/address",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's address or null", body = ApiResponse<Option<AddressDto>>)
    )
)]
pub async fn get_my_address(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Option<AddressDto>> {
    let address = state
        .identity
        .get_address(&user)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(address.map(Into::into))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me/address",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = SetAddressRequest,
    responses(
        (status = 200, description = "Address stored; coordinates may be null", body = ApiResponse<AddressDto>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn set_my_address(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<SetAddressRequest>,
) -> ApiResult<AddressDto> {
    let address = state
        .identity
        .set_address(
            &user,
            NewAddress {
                street: request.street,
                house_number: request.house_number,
                postal_code: request.postal_code,
                city: request.city,
            },
        )
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(address.into())))
}
