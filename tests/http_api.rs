//! REST API driven end to end: real registration, login and bearer tokens
//! against a migrated SQLite database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::Service;

use solar_market::infrastructure::crypto::jwt::JwtConfig;
use solar_market::infrastructure::{
    init_database, run_migrations, DatabaseConfig, LogNotifier, NullGeocoder,
    SeaOrmRepositoryProvider,
};
use solar_market::interfaces::http::{AppState, ServiceSettings};
use solar_market::create_api_router;

struct Client {
    router: Router,
}

impl Client {
    async fn new() -> Self {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();
        let state = AppState::new(
            Arc::new(SeaOrmRepositoryProvider::new(db)),
            Arc::new(LogNotifier),
            Arc::new(NullGeocoder),
            ServiceSettings {
                jwt: JwtConfig::new("http-api-test", 2),
                invoice_due_days: 30,
                annual_consumption_kwh: 3500,
                certificate_fee_cents: 19_900,
                dev_mode: true,
            },
        );
        Self {
            router: create_api_router(state),
        }
    }

    async fn send(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Registers and logs in; returns the bearer token.
    async fn sign_up(&mut self, email: &str, role: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "name": email,
                    "email": email,
                    "password": "photovoltaik",
                    "role": role
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = self
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": email, "password": "photovoltaik"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn registration_rules() {
    let mut client = Client::new().await;
    client.sign_up("haus@example.de", "household").await;

    let (status, _) = client
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "name": "Zweitkonto",
                "email": "HAUS@example.de",
                "password": "photovoltaik",
                "role": "household"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "name": "Chef",
                "email": "chef@example.de",
                "password": "photovoltaik",
                "role": "admin"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = client
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "name": "Unbekannt",
                "email": "wer@example.de",
                "password": "photovoltaik",
                "role": "landlord"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "name": "Kurz",
                "email": "kein-at-zeichen",
                "password": "kurz",
                "role": "household"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("email: "), "{message}");
    assert!(message.contains("password: "), "{message}");
}

#[tokio::test]
async fn pv_workflow_over_http() {
    let mut client = Client::new().await;
    let household = client.sign_up("haus@example.de", "household").await;
    let installer = client.sign_up("montage@example.de", "installer").await;
    let operator = client.sign_up("netz@example.de", "grid_operator").await;
    let consultant = client.sign_up("berater@example.de", "energy_consultant").await;

    let (status, body) = client
        .send("GET", "/api/v1/auth/me", Some(&household), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "household");

    let (status, body) = client
        .send(
            "POST",
            "/api/v1/installations",
            Some(&household),
            Some(json!({"notes": "Flachdach Garage"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    let base = format!("/api/v1/installations/{id}");

    // open requests are visible to every installer
    let (_, body) = client
        .send("GET", "/api/v1/installations", Some(&installer), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let steps = [
        (
            "POST",
            "/offer",
            &installer,
            Some(json!({"cost_cents": 980_000, "module_type": "Glas-Glas", "capacity_kw": 7.2})),
            "OfferMade",
        ),
        ("POST", "/accept", &household, None, "OfferAccepted"),
        ("POST", "/request-data", &installer, None, "DataRequested"),
        ("POST", "/release-data", &household, None, "DataReleased"),
        (
            "PUT",
            "/plan",
            &installer,
            Some(json!({
                "capacity_kw": 7.2,
                "area_m2": 40.0,
                "mounting_system": "FlatRoofMounting",
                "shading": "NoShade",
                "orientation": "S"
            })),
            "PlanCreated",
        ),
        ("POST", "/compatibility-check", &operator, None, "PlanCreated"),
        ("POST", "/feed-in", &operator, None, "FeedInGranted"),
    ];
    for (method, suffix, token, body, expected) in steps {
        let (status, response) = client
            .send(method, &format!("{base}{suffix}"), Some(token.as_str()), body)
            .await;
        assert_eq!(status, StatusCode::OK, "{suffix}: {response}");
        assert_eq!(response["data"]["status"], expected, "{suffix}");
    }

    let (status, body) = client
        .send("GET", &format!("{base}/offer"), Some(&household), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cost_cents"], 980_000);

    let (status, body) = client
        .send("POST", "/api/v1/certificates", Some(&household), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let certificate_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = client
        .send(
            "POST",
            &format!("/api/v1/certificates/{certificate_id}/issue"),
            Some(&consultant),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["certificate"]["status"], "Issued");
    assert_eq!(body["data"]["invoice"]["amount_cents"], 19_900);
    assert_eq!(body["data"]["updated_requests"], 1);

    let (_, body) = client.send("GET", &base, Some(&household), None).await;
    assert_eq!(body["data"]["status"], "AusweisIssued");

    let (status, body) = client
        .send(
            "POST",
            &format!("{base}/confirm-acceptance"),
            Some(&consultant),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Accepted");

    let (_, body) = client
        .send("GET", "/api/v1/invoices", Some(&household), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn contract_cancellation_over_http() {
    let mut client = Client::new().await;
    let household = client.sign_up("haus@example.de", "household").await;
    let operator = client.sign_up("netz@example.de", "grid_operator").await;

    let (status, body) = client
        .send(
            "POST",
            "/api/v1/tariffs",
            Some(&operator),
            Some(json!({
                "name": "Regional 12",
                "price_per_kwh_cents": 29,
                "base_fee_cents": 9_600,
                "term_months": 12
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tariff_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = client
        .send(
            "GET",
            &format!("/api/v1/tariffs/{tariff_id}/annual-charge"),
            Some(&household),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = client
        .send(
            "POST",
            "/api/v1/contracts",
            Some(&household),
            Some(json!({"tariff_id": tariff_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let contract_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = client
        .send(
            "POST",
            &format!("/api/v1/contracts/{contract_id}/cancellation"),
            Some(&household),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    // second request while one is pending
    let (status, _) = client
        .send(
            "POST",
            &format!("/api/v1/contracts/{contract_id}/cancellation"),
            Some(&household),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = client
        .send(
            "GET",
            "/api/v1/contracts/cancellations/pending",
            Some(&operator),
            None,
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = client
        .send(
            "POST",
            &format!("/api/v1/contracts/{contract_id}/cancellation/resolve"),
            Some(&operator),
            Some(json!({"action": "postpone"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .send(
            "POST",
            &format!("/api/v1/contracts/{contract_id}/cancellation/resolve"),
            Some(&operator),
            Some(json!({"action": "reject"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["contract"]["status"], "Running");
    assert!(body["data"]["invoice"].is_null());

    let (_, body) = client
        .send(
            "GET",
            "/api/v1/contracts/cancellations/pending",
            Some(&operator),
            None,
        )
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
