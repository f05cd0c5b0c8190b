//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::ports::{Geocoder, Notifier};
use crate::application::{
    BillingService, CertificateService, ContractService, IdentityService, InstallationService,
    InvoiceService, TariffService,
};
use crate::domain::{DomainError, RepositoryProvider};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{domain_error, ApiError, ApiResponse, PaginatedResponse};
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::metrics::{http_metrics_middleware, prometheus_metrics};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::{
    auth, billing, certificates, contracts, health, installations, invoices, tariffs, users,
};

/// Business settings the services are built with.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub jwt: JwtConfig,
    pub invoice_due_days: u32,
    pub annual_consumption_kwh: u32,
    pub certificate_fee_cents: i64,
    /// Echo internal error detail to clients
    pub dev_mode: bool,
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub identity: Arc<IdentityService>,
    pub installations: Arc<InstallationService>,
    pub tariffs: Arc<TariffService>,
    pub contracts: Arc<ContractService>,
    pub invoices: Arc<InvoiceService>,
    pub certificates: Arc<CertificateService>,
    pub billing: Arc<BillingService>,
    pub metrics: Option<PrometheusHandle>,
    pub annual_consumption_kwh: u32,
    pub dev_mode: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifier: Arc<dyn Notifier>,
        geocoder: Arc<dyn Geocoder>,
        settings: ServiceSettings,
    ) -> Self {
        let due = settings.invoice_due_days;
        Self {
            identity: Arc::new(IdentityService::new(repos.clone(), settings.jwt, geocoder)),
            installations: Arc::new(InstallationService::new(
                repos.clone(),
                notifier.clone(),
                due,
            )),
            tariffs: Arc::new(TariffService::new(repos.clone())),
            contracts: Arc::new(ContractService::new(
                repos.clone(),
                settings.annual_consumption_kwh,
                due,
            )),
            invoices: Arc::new(InvoiceService::new(repos.clone())),
            certificates: Arc::new(CertificateService::new(
                repos.clone(),
                notifier,
                settings.certificate_fee_cents,
                due,
            )),
            billing: Arc::new(BillingService::new(repos.clone(), due)),
            repos,
            metrics: None,
            annual_consumption_kwh: settings.annual_consumption_kwh,
            dev_mode: settings.dev_mode,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Maps a domain error to the HTTP error response.
    pub fn fail(&self, error: DomainError) -> ApiError {
        domain_error(error, self.dev_mode)
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        AuthState {
            identity: Arc::clone(&s.identity),
            dev_mode: s.dev_mode,
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT from POST /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::register,
        auth::get_current_user,
        auth::change_password,
        // Users
        users::list_users,
        users::get_user,
        users::change_role,
        users::set_active,
        users::get_my_address,
        users::set_my_address,
        // Installations
        installations::create_request,
        installations::list_requests,
        installations::get_request,
        installations::get_offer,
        installations::make_offer,
        installations::accept_offer,
        installations::reject_offer,
        installations::request_data,
        installations::release_data,
        installations::submit_plan,
        installations::check_compatibility,
        installations::grant_feed_in,
        installations::confirm_acceptance,
        // Tariffs
        tariffs::list_tariffs,
        tariffs::list_own_tariffs,
        tariffs::get_tariff,
        tariffs::annual_charge,
        tariffs::create_tariff,
        tariffs::update_tariff,
        tariffs::set_tariff_active,
        tariffs::delete_tariff,
        // Contracts
        contracts::create_contract,
        contracts::list_contracts,
        contracts::get_contract,
        contracts::request_cancellation,
        contracts::resolve_cancellation,
        contracts::pending_cancellations,
        // Invoices
        invoices::list_invoices,
        invoices::get_invoice,
        invoices::pay_invoice,
        invoices::export_invoices,
        // Certificates
        certificates::request_certificate,
        certificates::list_certificates,
        certificates::get_certificate,
        certificates::get_measure,
        certificates::enter_additional_data,
        certificates::issue_certificate,
        // Billing
        billing::run_billing,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginatedResponse<auth::UserInfo>,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            auth::UserInfo,
            auth::ChangePasswordRequest,
            auth::MessageResponse,
            users::ChangeRoleRequest,
            users::SetActiveRequest,
            users::SetAddressRequest,
            users::AddressDto,
            installations::InstallationResponse,
            installations::OfferResponse,
            installations::CreateInstallationRequest,
            installations::MakeOfferRequest,
            installations::SubmitPlanRequest,
            tariffs::TariffResponse,
            tariffs::TariffRequest,
            tariffs::SetTariffActiveRequest,
            tariffs::AnnualChargeResponse,
            contracts::ContractResponse,
            contracts::CreateContractRequest,
            contracts::RequestCancellationRequest,
            contracts::ResolveCancellationRequest,
            contracts::CancellationResponse,
            contracts::CancellationOutcomeResponse,
            invoices::InvoiceResponse,
            certificates::CertificateResponse,
            certificates::AdditionalDataRequest,
            certificates::MeasureResponse,
            certificates::IssuedCertificateResponse,
            billing::BillingRunRequest,
            billing::BillingRunResponse,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and storage reachability"),
        (name = "Authentication", description = "Login (JWT), self-registration, password change"),
        (name = "Users", description = "User administration and postal addresses"),
        (name = "Installations", description = "PV installation workflow from request to acceptance"),
        (name = "Tariffs", description = "Grid operator electricity tariffs"),
        (name = "Contracts", description = "Supply contracts and cancellations"),
        (name = "Invoices", description = "Invoices, payment status and CSV export"),
        (name = "Certificates", description = "Energy certificates (Energieausweis)"),
        (name = "Billing", description = "Yearly contract billing"),
    ),
    info(
        title = "Solar Market API",
        version = "1.0.0",
        description = "Marketplace backend for PV installations, grid tariffs, energy certificates and billing",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    let auth_layer = || middleware::from_fn_with_state(AuthState::from_ref(&state), auth_middleware);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::get_current_user))
        .route("/change-password", put(auth::change_password))
        .layer(auth_layer());

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route(
            "/me/address",
            get(users::get_my_address).put(users::set_my_address),
        )
        .route("/{id}", get(users::get_user))
        .route("/{id}/role", put(users::change_role))
        .route("/{id}/active", put(users::set_active))
        .layer(auth_layer());

    let installation_routes = Router::new()
        .route(
            "/",
            get(installations::list_requests).post(installations::create_request),
        )
        .route("/{id}", get(installations::get_request))
        .route(
            "/{id}/offer",
            get(installations::get_offer).post(installations::make_offer),
        )
        .route("/{id}/accept", post(installations::accept_offer))
        .route("/{id}/reject", post(installations::reject_offer))
        .route("/{id}/request-data", post(installations::request_data))
        .route("/{id}/release-data", post(installations::release_data))
        .route("/{id}/plan", put(installations::submit_plan))
        .route(
            "/{id}/compatibility-check",
            post(installations::check_compatibility),
        )
        .route("/{id}/feed-in", post(installations::grant_feed_in))
        .route(
            "/{id}/confirm-acceptance",
            post(installations::confirm_acceptance),
        )
        .layer(auth_layer());

    let tariff_routes = Router::new()
        .route("/", get(tariffs::list_tariffs).post(tariffs::create_tariff))
        .route("/mine", get(tariffs::list_own_tariffs))
        .route(
            "/{id}",
            get(tariffs::get_tariff)
                .put(tariffs::update_tariff)
                .delete(tariffs::delete_tariff),
        )
        .route("/{id}/active", put(tariffs::set_tariff_active))
        .route("/{id}/annual-charge", get(tariffs::annual_charge))
        .layer(auth_layer());

    let contract_routes = Router::new()
        .route(
            "/",
            get(contracts::list_contracts).post(contracts::create_contract),
        )
        .route(
            "/cancellations/pending",
            get(contracts::pending_cancellations),
        )
        .route("/{id}", get(contracts::get_contract))
        .route("/{id}/cancellation", post(contracts::request_cancellation))
        .route(
            "/{id}/cancellation/resolve",
            post(contracts::resolve_cancellation),
        )
        .layer(auth_layer());

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices))
        .route("/export", get(invoices::export_invoices))
        .route("/{id}", get(invoices::get_invoice))
        .route("/{id}/pay", post(invoices::pay_invoice))
        .layer(auth_layer());

    let certificate_routes = Router::new()
        .route(
            "/",
            get(certificates::list_certificates).post(certificates::request_certificate),
        )
        .route("/{id}", get(certificates::get_certificate))
        .route("/{id}/measure", get(certificates::get_measure))
        .route(
            "/{id}/additional-data",
            post(certificates::enter_additional_data),
        )
        .route("/{id}/issue", post(certificates::issue_certificate))
        .layer(auth_layer());

    let billing_routes = Router::new()
        .route("/run", post(billing::run_billing))
        .layer(auth_layer());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api/v1/auth", auth_routes.merge(auth_protected_routes))
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/installations", installation_routes)
        .nest("/api/v1/tariffs", tariff_routes)
        .nest("/api/v1/contracts", contract_routes)
        .nest("/api/v1/invoices", invoice_routes)
        .nest("/api/v1/certificates", certificate_routes)
        .nest("/api/v1/billing", billing_routes)
        .with_state(state)
        .merge(swagger_routes)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
