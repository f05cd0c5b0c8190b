//! Outbound ports
//!
//! Narrow contracts for the collaborators the marketplace only talks to:
//! mail delivery and address geocoding. Adapters live in
//! `infrastructure::notifications` and `infrastructure::geocoding`.

use async_trait::async_trait;

/// Fire-and-forget message delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `subject`/`body` to `to`. Errors are for logging only;
    /// callers never retry.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Address to coordinates lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` on timeout or when the address is unknown.
    async fn geocode(&self, address: &str) -> Option<(f64, f64)>;
}

/// Look up the user's address and send; every failure is logged and
/// swallowed.
pub async fn notify_user(
    repos: &dyn crate::domain::RepositoryProvider,
    notifier: &dyn Notifier,
    user_id: i32,
    subject: &str,
    body: &str,
) {
    let email = match repos.users().find_by_id(user_id).await {
        Ok(Some(user)) => user.email,
        Ok(None) => {
            tracing::warn!(user_id, subject, "Notification recipient not found");
            return;
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Notification recipient lookup failed");
            return;
        }
    };
    if let Err(e) = notifier.send(&email, subject, body).await {
        tracing::warn!(user_id, subject, error = %e, "Notification delivery failed");
    }
}
