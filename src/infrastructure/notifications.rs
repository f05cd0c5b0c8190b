//! Notification adapters

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::Notifier;

/// Writes every message to the log instead of sending mail.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        info!(to, subject, body_len = body.len(), "📧 Notification");
        Ok(())
    }
}
