//! Ledger Error Types
//!
//! Engine errors that don't depend on the HTTP layer.

use thiserror::Error;

use super::amount::AmountError;

/// Result type used by the store, the transaction engine and the account service.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failures reported by the store, the transaction engine and the domain operations.
///
/// Every failure raised inside a unit of work is treated the same way by the
/// transaction manager: the transaction is rolled back and the error is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// No account with this identifier
    #[error("Account {0} does not exist")]
    AccountNotFound(String),

    /// An account with this identifier already exists
    #[error("Account id {0} already exists!")]
    DuplicateEntity(String),

    /// Balance lower than the requested debit
    #[error("Insufficient balance in account {account_id}")]
    InsufficientBalance { account_id: String },

    /// Blocked accounts can neither send nor receive
    #[error("Account {0} is blocked from performing transactions")]
    AccountBlocked(String),

    /// Invalid amount (negative or unparseable)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A transaction is already running on this manager
    #[error("A transaction is already active")]
    TransactionAlreadyActive,

    /// Commit requested without a running transaction
    #[error("No active transaction")]
    NoActiveTransaction,

    /// Record changed by another transaction since it was read (optimistic commit only)
    #[error("Version conflict on account {account_id}: expected {expected}, found {found}")]
    VersionConflict {
        account_id: String,
        expected: u64,
        found: u64,
    },
}

impl LedgerError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(account_id: impl Into<String>) -> Self {
        Self::InsufficientBalance {
            account_id: account_id.into(),
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_)
                | Self::DuplicateEntity(_)
                | Self::InsufficientBalance { .. }
                | Self::AccountBlocked(_)
                | Self::InvalidAmount(_)
        )
    }

    /// Check if this is a conflict error (retry may help)
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Check if this reports misuse of the transaction protocol
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::TransactionAlreadyActive | Self::NoActiveTransaction
        )
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
