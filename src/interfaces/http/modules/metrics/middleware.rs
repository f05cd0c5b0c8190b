//! Per-request counters and latency histogram

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

/// Label for requests that matched no route (scanners, typos).
const UNMATCHED: &str = "unmatched";

/// Records `http_requests_total{method,route,status}`,
/// `http_request_duration_seconds{method,route}` and, for 4xx/5xx,
/// `http_errors_total{route,class}`.
///
/// `route` is the template (`/api/v1/invoices/{id}`), so ids never become
/// label values.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED.to_owned(), |p| p.as_str().to_owned());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    let status = response.status();
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.clone(),
        "route" => route.clone()
    )
    .record(elapsed);
    metrics::counter!(
        "http_requests_total",
        "method" => method,
        "route" => route.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    if status.is_client_error() || status.is_server_error() {
        let class = if status.is_server_error() { "server" } else { "client" };
        metrics::counter!("http_errors_total", "route" => route, "class" => class).increment(1);
    }

    response
}
