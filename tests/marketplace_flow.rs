//! End-to-end marketplace scenarios against a migrated SQLite database.

use std::sync::Arc;

use chrono::NaiveDate;
use solar_market::application::identity::Registration;
use solar_market::application::services::{MeasureInput, TariffInput};
use solar_market::domain::installation::{OfferDetails, PlanDetails};
use solar_market::domain::{
    CertificateStatus, ContractStatus, DomainError, InvoiceCategory, MountingSystem, Orientation,
    PaymentStatus, ProcessStatus, ShadingClass, User, UserRole,
};
use solar_market::infrastructure::crypto::jwt::JwtConfig;
use solar_market::infrastructure::{
    init_database, run_migrations, DatabaseConfig, LogNotifier, NullGeocoder,
    SeaOrmRepositoryProvider,
};
use solar_market::interfaces::http::{AppState, ServiceSettings};

const CERTIFICATE_FEE: i64 = 25_000;

struct Market {
    state: AppState,
    household: User,
    installer: User,
    operator: User,
    consultant: User,
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn register(state: &AppState, email: &str, role: UserRole) -> User {
    state
        .identity
        .register(Registration {
            name: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            password: "sonnenschein".to_string(),
            role,
        })
        .await
        .unwrap()
}

async fn market() -> Market {
    let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&db).await.unwrap();

    let state = AppState::new(
        Arc::new(SeaOrmRepositoryProvider::new(db)),
        Arc::new(LogNotifier),
        Arc::new(NullGeocoder),
        ServiceSettings {
            jwt: JwtConfig::new("flow-test-secret", 1),
            invoice_due_days: 14,
            annual_consumption_kwh: 3500,
            certificate_fee_cents: CERTIFICATE_FEE,
            dev_mode: false,
        },
    );

    let household = register(&state, "familie.weber@example.de", UserRole::Household).await;
    let installer = register(&state, "dachprofi@example.de", UserRole::Installer).await;
    let operator = register(&state, "stadtwerke@example.de", UserRole::GridOperator).await;
    let consultant = register(&state, "beratung@example.de", UserRole::EnergyConsultant).await;

    Market {
        state,
        household,
        installer,
        operator,
        consultant,
    }
}

fn roof_plan() -> PlanDetails {
    PlanDetails {
        capacity_kw: 9.8,
        area_m2: 52.0,
        mounting_system: MountingSystem::RoofMounting,
        shading: ShadingClass::MinimalShade,
        orientation: Some(Orientation::S),
        inclination_deg: Some(35.0),
    }
}

impl Market {
    /// Drives a fresh request from creation to a granted feed-in.
    async fn request_with_feed_in(&self) -> i32 {
        let svc = &self.state.installations;
        let id = svc
            .create_request(&self.household, Some("Satteldach, Süd".into()))
            .await
            .unwrap()
            .id;
        svc.make_offer(
            &self.installer,
            id,
            OfferDetails {
                cost_cents: 1_450_000,
                module_type: "Mono 420 Wp".into(),
                capacity_kw: 9.8,
            },
        )
        .await
        .unwrap();
        svc.accept_offer(&self.household, id).await.unwrap();
        svc.request_data(&self.installer, id).await.unwrap();
        svc.release_data(&self.household, id).await.unwrap();
        svc.submit_plan(&self.installer, id, roof_plan()).await.unwrap();
        svc.check_compatibility(&self.operator, id).await.unwrap();
        svc.grant_feed_in(&self.operator, id).await.unwrap();
        id
    }

    async fn tariff(&self, name: &str) -> i32 {
        self.state
            .tariffs
            .create(
                &self.operator,
                TariffInput {
                    name: name.into(),
                    price_per_kwh_cents: 32,
                    base_fee_cents: 11_900,
                    term_months: 24,
                },
            )
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn login_resolves_to_registered_user() {
    let m = market().await;
    let auth = m
        .state
        .identity
        .authenticate("familie.weber@example.de", "sonnenschein")
        .await
        .unwrap();
    assert_eq!(auth.token_type, "Bearer");
    assert_eq!(auth.expires_in, 3600);

    let resolved = m.state.identity.resolve(&auth.token).await.unwrap();
    assert_eq!(resolved.id, m.household.id);
    assert!(resolved.last_login_at.is_some());

    assert!(matches!(
        m.state
            .identity
            .authenticate("familie.weber@example.de", "falsch-falsch")
            .await,
        Err(DomainError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn installation_runs_through_certificate_to_acceptance() {
    let m = market().await;
    let id = m.request_with_feed_in().await;

    let request = m.state.installations.get(&m.household, id).await.unwrap();
    assert_eq!(request.status, ProcessStatus::FeedInGranted);
    assert_eq!(request.grid_compatible, Some(true));
    assert_eq!(request.grid_operator_id, Some(m.operator.id));
    assert_eq!(request.capacity_kw, Some(9.8));

    let certificate = m.state.certificates.request(&m.household).await.unwrap();
    let request = m.state.installations.get(&m.household, id).await.unwrap();
    assert_eq!(request.status, ProcessStatus::AusweisRequested);
    assert_eq!(request.certificate_id, Some(certificate.id));

    let waiting = m.state.certificates.list(&m.consultant).await.unwrap();
    assert_eq!(waiting.len(), 1);

    m.state
        .certificates
        .enter_additional_data(
            &m.consultant,
            certificate.id,
            MeasureInput {
                description: "Kellerdecke dämmen".into(),
                estimated_savings_kwh: 1_200.0,
            },
        )
        .await
        .unwrap();

    let issued = m
        .state
        .certificates
        .issue(&m.consultant, certificate.id, day(2025, 6, 2))
        .await
        .unwrap();
    assert_eq!(issued.certificate.status, CertificateStatus::Issued);
    assert_eq!(issued.certificate.valid_until, Some(day(2035, 6, 2)));
    assert_eq!(issued.updated_requests, 1);
    assert_eq!(issued.invoice.amount_cents, CERTIFICATE_FEE);
    assert_eq!(issued.invoice.category, InvoiceCategory::ConsultantInvoice);

    let measure = m
        .state
        .certificates
        .get_measure(&m.household, certificate.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(measure.description, "Kellerdecke dämmen");

    let done = m
        .state
        .installations
        .confirm_acceptance(&m.operator, id)
        .await
        .unwrap();
    assert_eq!(done.status, ProcessStatus::Accepted);

    // installer invoice from the accepted offer plus the certificate fee
    let invoices = m.state.invoices.list(&m.household).await.unwrap();
    let mut categories: Vec<_> = invoices.iter().map(|i| i.category).collect();
    categories.sort_by_key(|c| c.as_str());
    assert_eq!(
        categories,
        vec![
            InvoiceCategory::ConsultantInvoice,
            InvoiceCategory::InstallerInvoice
        ]
    );
}

#[tokio::test]
async fn certificate_request_skips_finished_requests() {
    let m = market().await;
    let finished = m.request_with_feed_in().await;
    m.state
        .installations
        .confirm_acceptance(&m.operator, finished)
        .await
        .unwrap();
    let open = m
        .state
        .installations
        .create_request(&m.household, None)
        .await
        .unwrap()
        .id;

    let certificate = m.state.certificates.request(&m.household).await.unwrap();

    let finished = m.state.installations.get(&m.household, finished).await.unwrap();
    assert_eq!(finished.status, ProcessStatus::Accepted);
    assert_eq!(finished.certificate_id, None);

    let open = m.state.installations.get(&m.household, open).await.unwrap();
    assert_eq!(open.status, ProcessStatus::AusweisRequested);
    assert_eq!(open.certificate_id, Some(certificate.id));
}

#[tokio::test]
async fn certificate_needs_a_request() {
    let m = market().await;
    assert!(matches!(
        m.state.certificates.request(&m.household).await,
        Err(DomainError::Precondition(_))
    ));
    assert!(m.state.certificates.list(&m.household).await.unwrap().is_empty());
}

#[tokio::test]
async fn billing_twice_on_the_same_day_issues_one_invoice() {
    let m = market().await;
    let tariff_id = m.tariff("Stadtstrom 24").await;
    let contract = m
        .state
        .contracts
        .create(&m.household, tariff_id, day(2025, 3, 15))
        .await
        .unwrap();
    assert_eq!(contract.annual_charge_cents, 11_900 + 32 * 3500);

    let first = m.state.billing.run_billing_cycle(day(2026, 3, 20)).await.unwrap();
    assert_eq!(first.scanned, 1);
    assert_eq!(first.invoiced, 1);
    assert_eq!(first.failed, 0);

    let second = m.state.billing.run_billing_cycle(day(2026, 3, 20)).await.unwrap();
    assert_eq!(second.invoiced, 0);
    assert_eq!(second.skipped, 1);

    let invoices = m.state.invoices.list(&m.household).await.unwrap();
    assert_eq!(invoices.len(), 1);
    let invoice = &invoices[0];
    assert_eq!(invoice.category, InvoiceCategory::GridOperatorInvoice);
    assert_eq!(invoice.contract_id, Some(contract.id));
    assert_eq!(invoice.amount_cents, contract.annual_charge_cents);
    assert_eq!(invoice.issuer_id, m.operator.id);

    // before the anniversary nothing is due
    let early = m.state.billing.run_billing_cycle(day(2027, 1, 10)).await.unwrap();
    assert_eq!(early.invoiced, 0);

    let paid = m.state.invoices.mark_paid(&m.household, invoice.id).await.unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn tariff_is_locked_while_contracts_run() {
    let m = market().await;
    let tariff_id = m.tariff("Ökostrom Plus").await;
    let contract = m
        .state
        .contracts
        .create(&m.household, tariff_id, day(2025, 1, 1))
        .await
        .unwrap();

    assert!(matches!(
        m.state.tariffs.delete(&m.operator, tariff_id).await,
        Err(DomainError::Conflict(_))
    ));
    assert!(matches!(
        m.state.tariffs.set_active(&m.operator, tariff_id, false).await,
        Err(DomainError::Conflict(_))
    ));

    m.state
        .contracts
        .request_cancellation(&m.household, contract.id, None)
        .await
        .unwrap();
    let outcome = m
        .state
        .contracts
        .resolve_cancellation(&m.operator, contract.id, "confirm", day(2025, 7, 1))
        .await
        .unwrap();
    assert_eq!(outcome.contract.status, ContractStatus::Cancelled);
    assert!(outcome.replacement.is_none());
    let settlement = outcome.invoice.unwrap();
    assert!(settlement.amount_cents > 0);
    assert!(settlement.amount_cents < contract.annual_charge_cents);

    m.state.tariffs.delete(&m.operator, tariff_id).await.unwrap();
}

#[tokio::test]
async fn cancellation_with_replacement_moves_household() {
    let m = market().await;
    let old = m.tariff("Grundversorgung").await;
    let new = m.tariff("Wärmepumpe 2025").await;
    let contract = m
        .state
        .contracts
        .create(&m.household, old, day(2025, 1, 1))
        .await
        .unwrap();

    m.state
        .contracts
        .request_cancellation(&m.household, contract.id, Some(new))
        .await
        .unwrap();
    let pending = m
        .state
        .contracts
        .pending_cancellations(&m.operator)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].replacement_tariff_id, Some(new));

    let outcome = m
        .state
        .contracts
        .resolve_cancellation(&m.operator, contract.id, "confirm", day(2025, 9, 1))
        .await
        .unwrap();
    let replacement = outcome.replacement.unwrap();
    assert_eq!(replacement.tariff_id, new);
    assert_eq!(replacement.start_date, day(2025, 9, 1));

    let open: Vec<_> = m
        .state
        .contracts
        .list(&m.household)
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.status != ContractStatus::Cancelled)
        .collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, replacement.id);
}

#[tokio::test]
async fn replacement_cannot_duplicate_a_running_contract() {
    let m = market().await;
    let first = m.tariff("Grundversorgung").await;
    let second = m.tariff("Nachtstrom").await;
    let contract = m
        .state
        .contracts
        .create(&m.household, first, day(2025, 1, 1))
        .await
        .unwrap();
    m.state
        .contracts
        .create(&m.household, second, day(2025, 1, 1))
        .await
        .unwrap();

    assert!(matches!(
        m.state
            .contracts
            .request_cancellation(&m.household, contract.id, Some(second))
            .await,
        Err(DomainError::Conflict(_))
    ));

    let open_on_second = m
        .state
        .contracts
        .list(&m.household)
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.tariff_id == second && c.status != ContractStatus::Cancelled)
        .count();
    assert_eq!(open_on_second, 1);
}
