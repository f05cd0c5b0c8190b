use axum::{extract::State, Extension, Json};
use chrono::Utc;

use super::dto::{BillingRunRequest, BillingRunResponse};
use crate::application::identity::require_role;
use crate::domain::{DomainError, User, UserRole};
use crate::interfaces::http::common::{ApiResponse, ApiResult};
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/billing/run",
    tag = "Billing",
    security(("bearer_auth" = [])),
    request_body = BillingRunRequest,
    responses(
        (status = 200, description = "Billing cycle finished", body = ApiResponse<BillingRunResponse>),
        (status = 400, description = "Date in the future"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn run_billing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<BillingRunRequest>,
) -> ApiResult<BillingRunResponse> {
    require_role(&user, &[UserRole::Admin]).map_err(|e| state.fail(e))?;

    let today = Utc::now().date_naive();
    let date = request.date.unwrap_or(today);
    if date > today {
        return Err(state.fail(DomainError::BadRequest(
            "billing date must not lie in the future".into(),
        )));
    }
    tracing::info!(admin_id = user.id, %date, "Manual billing run requested");

    let summary = state
        .billing
        .run_billing_cycle(date)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(ApiResponse::success(BillingRunResponse::new(date, summary))))
}
