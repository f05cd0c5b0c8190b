//! Graceful shutdown handling
//!
//! A cloneable [`ShutdownSignal`] fans one SIGTERM/SIGINT out to the REST
//! server and the billing scheduler. The flag lives in a `watch` channel,
//! so a task that starts waiting after the trigger still sees it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ShutdownSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Idempotent; only the first call logs.
    pub fn trigger(&self) {
        let first = self.flag.send_if_modified(|triggered| {
            let changed = !*triggered;
            *triggered = true;
            changed
        });
        if first {
            info!("🛑 Shutdown signal triggered");
        }
    }

    /// Resolves once shutdown has been triggered.
    pub async fn wait(&self) {
        let mut rx = self.flag.subscribe();
        // the sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Triggers `shutdown` on SIGTERM or SIGINT (Ctrl+C outside unix).
pub async fn listen_for_shutdown_signals(shutdown: ShutdownSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => info!("📡 SIGTERM received"),
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("📡 SIGINT received"),
                Err(e) => {
                    error!(error = %e, "Cannot listen for SIGINT");
                    return;
                }
            },
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl+C");
            return;
        }
        info!("📡 Ctrl+C received");
    }

    shutdown.trigger();
}

/// Owns the process-wide signal and the cleanup deadline.
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    deadline: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            signal: ShutdownSignal::new(),
            deadline: Duration::from_secs(timeout_secs),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn start_signal_listener(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.signal()));
    }

    /// Runs `cleanup` until it finishes or the deadline passes.
    /// Returns whether it finished.
    pub async fn run_cleanup<F, Fut>(&self, cleanup: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(deadline_secs = self.deadline.as_secs(), "⏳ Draining background tasks");
        let finished = tokio::time::timeout(self.deadline, cleanup()).await.is_ok();
        if finished {
            info!("✅ Background tasks drained");
        } else {
            warn!(
                deadline_secs = self.deadline.as_secs(),
                "⚠️ Background tasks still running at the shutdown deadline"
            );
        }
        finished
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(30)
    }
}
