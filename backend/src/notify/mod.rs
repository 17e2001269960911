pub mod errors;
pub mod telegram;

use async_trait::async_trait;

pub use errors::NotifyError;
pub use telegram::TelegramNotifier;

/// Delivery channel for finished reports.
///
/// Callers log failures and move on; nothing is retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}
