use anyhow::Result;

use super::Notifier;

/// Dry-run notifier: writes every message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, destination: &str, text: &str) -> Result<()> {
        tracing::info!(target: "deliver", %destination, %text, "dry-run delivery");
        Ok(())
    }
}
