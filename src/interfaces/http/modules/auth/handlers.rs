//! Authentication API handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserInfo,
};
use crate::application::identity::Registration;
use crate::domain::{DomainError, User, UserRole};
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is deactivated"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let auth = state
        .identity
        .authenticate(&request.email, &request.password)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(ApiResponse::success(LoginResponse {
        token: auth.token,
        token_type: auth.token_type,
        expires_in: auth.expires_in,
        user: auth.user.into(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserInfo>),
        (status = 400, description = "Malformed body or unknown role"),
        (status = 403, description = "Admin accounts cannot self-register"),
        (status = 422, description = "Field validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let role: UserRole = request
        .role
        .parse()
        .map_err(|e: String| state.fail(DomainError::BadRequest(e)))?;

    let user = state
        .identity
        .register(Registration {
            name: request.name,
            email: request.email,
            password: request.password,
            role,
        })
        .await
        .map_err(|e| state.fail(e))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user info", body = ApiResponse<UserInfo>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(Extension(user): Extension<User>) -> ApiResult<UserInfo> {
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/change-password",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Invalid current password")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    state
        .identity
        .change_password(&user, &request.current_password, &request.new_password)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Passwort wurde geändert".to_string(),
    })))
}
