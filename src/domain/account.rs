//! Account record
//!
//! The only entity held by the store. Outside of a transaction callers only
//! ever see owned snapshots of it.

use serde::{Deserialize, Serialize};

use super::amount::Balance;

/// Account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique, immutable identifier
    account_id: String,

    /// Current balance
    balance: Balance,

    /// Blocked accounts can neither send nor receive money
    #[serde(default)]
    blocked: bool,

    /// Store version, bumped every time a commit changes the record
    #[serde(skip)]
    version: u64,
}

impl Account {
    /// Create an unblocked account
    pub fn new(account_id: impl Into<String>, balance: Balance) -> Self {
        Self {
            account_id: account_id.into(),
            balance,
            blocked: false,
            version: 0,
        }
    }

    /// Create an account with the given blocked flag
    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.blocked = blocked;
        self
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    // =========================================================================
    // Crate-private mutation (working copies and commit only)
    // =========================================================================

    pub(crate) fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    /// Overwrite the mutable fields, bumping the version if anything changed.
    /// Returns whether the record changed.
    pub(crate) fn overwrite(&mut self, balance: Balance, blocked: bool) -> bool {
        if self.balance == balance && self.blocked == blocked {
            return false;
        }
        self.balance = balance;
        self.blocked = blocked;
        self.version += 1;
        true
    }
}
