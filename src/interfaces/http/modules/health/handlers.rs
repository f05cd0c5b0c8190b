//! Liveness and storage probe

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::interfaces::http::router::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
    /// Whether `/metrics` serves data
    pub metrics_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: &'static str,
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    fn up(since: Instant) -> Self {
        Self {
            status: "ok",
            latency_ms: Some(since.elapsed().as_millis().try_into().unwrap_or(u64::MAX)),
        }
    }

    fn down() -> Self {
        Self {
            status: "error",
            latency_ms: None,
        }
    }

    fn is_up(&self) -> bool {
        self.status == "ok"
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = Instant::now();
    let database = match state.repos.ping().await {
        Ok(()) => ComponentHealth::up(probe),
        Err(e) => {
            tracing::warn!(error = %e, "Storage ping failed");
            ComponentHealth::down()
        }
    };

    let code = if database.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if database.is_up() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database,
        metrics_enabled: state.metrics.is_some(),
    };
    (code, Json(body))
}
