//! Account Store
//!
//! Keyed in-memory store of account records. It holds no transactional
//! logic of its own: reads hand out owned snapshots, and the only write path
//! after creation is `apply`/`apply_all`, reserved for transaction commit.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::domain::{Account, Balance, LedgerError, LedgerResult};

/// New values for one record, produced by a committing transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub account_id: String,
    pub balance: Balance,
    pub blocked: bool,
    /// When set, the stored version must still equal this value
    pub expected_version: Option<u64>,
}

/// In-memory account store shared by every transaction
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new account
    ///
    /// # Errors
    /// - `LedgerError::DuplicateEntity` if the identifier is taken; the
    ///   existing record is left untouched
    pub fn create(&self, account: Account) -> LedgerResult<()> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(account.account_id()) {
            return Err(LedgerError::DuplicateEntity(account.account_id().to_string()));
        }

        tracing::debug!(account_id = %account.account_id(), "Account created");
        accounts.insert(account.account_id().to_string(), account);
        Ok(())
    }

    /// Snapshot of the stored record
    pub fn get(&self, account_id: &str) -> Option<Account> {
        self.accounts.read().get(account_id).cloned()
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.read().contains_key(account_id)
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Remove every account
    pub fn clear(&self) {
        self.accounts.write().clear();
    }

    /// Replace the mutable fields of a single record
    #[cfg(test)]
    pub(crate) fn apply(&self, account_id: &str, balance: Balance, blocked: bool) -> LedgerResult<()> {
        self.apply_all(&[RecordUpdate {
            account_id: account_id.to_string(),
            balance,
            blocked,
            expected_version: None,
        }])
    }

    /// Apply a whole commit under one write lock.
    ///
    /// Every update is validated before the first one is written, so a
    /// failure leaves the store unchanged.
    pub(crate) fn apply_all(&self, updates: &[RecordUpdate]) -> LedgerResult<()> {
        let mut accounts = self.accounts.write();

        for update in updates {
            let stored = accounts
                .get(&update.account_id)
                .ok_or_else(|| LedgerError::AccountNotFound(update.account_id.clone()))?;

            if let Some(expected) = update.expected_version {
                if stored.version() != expected {
                    return Err(LedgerError::VersionConflict {
                        account_id: update.account_id.clone(),
                        expected,
                        found: stored.version(),
                    });
                }
            }
        }

        for update in updates {
            if let Some(stored) = accounts.get_mut(&update.account_id) {
                stored.overwrite(update.balance, update.blocked);
            }
        }

        Ok(())
    }
}
