//! Notification module
//!
//! Outbound notices to account holders after a transfer.

use crate::domain::Account;

/// Delivers transfer notices to account holders
pub trait NotificationService: Send + Sync {
    fn notify_about_transfer(&self, account: &Account, transfer_description: &str);
}

/// Writes notices to the tracing log instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationService;

impl NotificationService for LoggingNotificationService {
    fn notify_about_transfer(&self, account: &Account, transfer_description: &str) {
        tracing::info!(
            account_id = %account.account_id(),
            description = %transfer_description,
            "Sending transfer notification"
        );
    }
}

/// Notice sent to the debited account
pub fn debit_description(account_id: &str, amount: impl std::fmt::Display) -> String {
    format!("Account Id: {}. Amount Debited: {}", account_id, amount)
}

/// Notice sent to the credited account
pub fn credit_description(account_id: &str, amount: impl std::fmt::Display) -> String {
    format!("Account Id: {}. Amount Credited: {}", account_id, amount)
}
