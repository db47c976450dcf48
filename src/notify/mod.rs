// src/notify/mod.rs
//! Delivery collaborators. The scheduler only sees [`Notifier`].

pub mod log;
pub mod telegram;

use anyhow::Result;

pub use log::LogNotifier;
pub use telegram::TelegramNotifier;

/// Delivers an already rendered MarkdownV2 message to a destination.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, destination: &str, text: &str) -> Result<()>;
}

/// Telegram when a bot token is present in the environment, log-only otherwise.
pub fn notifier_from_env(max_retries: u8, timeout_secs: u64) -> Box<dyn Notifier> {
    match telegram::token_from_env() {
        Some(token) => Box::new(
            TelegramNotifier::new(token)
                .with_retries(max_retries)
                .with_timeout(timeout_secs),
        ),
        None => {
            tracing::warn!(target: "deliver", "no TELEGRAM_BOT_TOKEN/BOT_TOKEN set; messages are only logged");
            Box::new(LogNotifier)
        }
    }
}
