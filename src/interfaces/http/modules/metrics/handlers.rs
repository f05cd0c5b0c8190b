//! `GET /metrics` in Prometheus text format (no auth)

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::interfaces::http::router::AppState;

/// 503 when the server runs without a recorder.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.as_ref() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [("content-type", "text/plain; charset=utf-8")],
            "metrics recorder not installed\n".to_string(),
        ),
    }
}
