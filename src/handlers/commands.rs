//! Command definitions
//!
//! Commands represent intentions to change account state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command to open a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub account_id: String,
    /// Opening balance (must not be negative)
    pub balance: Decimal,
    pub blocked: bool,
}

impl CreateAccountCommand {
    pub fn new(account_id: impl Into<String>, balance: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            balance,
            blocked: false,
        }
    }

    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }
}

/// Command to move money between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub account_from: String,
    pub account_to: String,
    /// Amount to transfer (validated before the transaction starts)
    pub amount: Decimal,
}

impl TransferCommand {
    pub fn new(account_from: impl Into<String>, account_to: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_from: account_from.into(),
            account_to: account_to.into(),
            amount,
        }
    }
}

/// Result of a committed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub account_from: String,
    pub account_to: String,
    pub amount: Decimal,
    pub completed_at: DateTime<Utc>,
}
