//! Reusable marketplace server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, default admin, services, REST API, billing
//! scheduler, metrics, and graceful shutdown.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::application::services::start_billing_scheduler;
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::{
    init_database, run_migrations, InMemoryStorage, LogNotifier, NullGeocoder,
    SeaOrmRepositoryProvider,
};
use crate::interfaces::http::{create_api_router, AppState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the marketplace server.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create default admin user if none exists (default: true).
    pub create_default_admin: bool,
    /// Keep everything in memory instead of opening the database.
    pub in_memory: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
            in_memory: false,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running marketplace server.
///
/// ```rust,no_run
/// use solar_market::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Port the REST API is listening on (resolved when 0 was configured).
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    billing_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Start the marketplace with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Connect to the database and run migrations
    /// 3. Create the default admin user (if enabled)
    /// 4. Start the REST API server (with Swagger UI)
    /// 5. Start the billing scheduler
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting solar marketplace...");

        let prometheus_handle = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            if opts.in_memory {
                warn!("Running with in-memory storage; nothing survives a restart");
                (Arc::new(InMemoryStorage::new()), None)
            } else {
                let db = init_database(&app_cfg.database_config()).await?;
                if opts.auto_migrate {
                    info!("Running database migrations...");
                    run_migrations(&db).await?;
                }
                (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
            };

        // ── Services ───────────────────────────────────────────
        let settings = app_cfg.service_settings();
        info!(
            "JWT configured with {}h token expiration",
            settings.jwt.expiration_hours
        );
        let mut state = AppState::new(
            repos.clone(),
            Arc::new(LogNotifier),
            Arc::new(NullGeocoder),
            settings,
        );
        if let Some(handle) = prometheus_handle {
            state = state.with_metrics(handle);
        }

        if opts.create_default_admin {
            match state
                .identity
                .ensure_default_admin(&app_cfg.admin.email, &app_cfg.admin.password)
                .await
            {
                Ok(Some(_)) => {
                    info!("Default admin created: {}", app_cfg.admin.email);
                    info!("⚠️  Please change the admin password immediately!");
                }
                Ok(None) => {}
                Err(e) => error!("Failed to create admin user: {}", e),
            }
        }

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Background tasks ───────────────────────────────────
        let billing_task = if app_cfg.billing.enabled {
            Some(start_billing_scheduler(
                state.billing.clone(),
                shutdown_signal.clone(),
                Duration::from_secs(app_cfg.billing.interval_hours * 3600),
            ))
        } else {
            info!("Billing scheduler disabled");
            None
        };

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(state);

        let listener = tokio::net::TcpListener::bind(app_cfg.api_address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            repos,
            config: app_cfg,
            api_port: local_addr.port(),
            db,
            shutdown,
            api_task,
            billing_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        let billing_task = self.billing_task;
        self.shutdown
            .run_cleanup(|| async move {
                if let Some(task) = billing_task {
                    if let Err(e) = task.await {
                        error!("Billing scheduler task panicked: {}", e);
                    }
                }
            })
            .await;

        if let Some(db) = self.db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("✅ Database connection closed");
            }
        }

        info!("👋 Solar marketplace shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down solar marketplace...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the REST server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global metrics recorder can only be installed once per process;
/// a restart within the same process reuses it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Prometheus recorder unavailable, /metrics disabled: {}", e);
                None
            }
        })
        .clone()
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    async fn get(port: u16, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn in_memory_options() -> ServerOptions {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.billing.enabled = false;
        ServerOptions {
            config,
            in_memory: true,
            ..ServerOptions::default()
        }
    }

    #[tokio::test]
    async fn serves_health_and_shuts_down() {
        let handle = ServerHandle::start(in_memory_options()).await.unwrap();
        assert!(handle.is_running());
        assert_eq!(handle.repos.users().count().await.unwrap(), 1);

        let response = get(handle.api_port, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"status\":\"ok\""));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn default_admin_can_be_skipped() {
        let mut opts = in_memory_options();
        opts.create_default_admin = false;
        let handle = ServerHandle::start(opts).await.unwrap();
        assert_eq!(handle.repos.users().count().await.unwrap(), 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_config_is_refused() {
        let mut opts = in_memory_options();
        opts.config.security.jwt_secret = String::new();
        assert!(ServerHandle::start(opts).await.is_err());
    }
}
