//! Isolation context
//!
//! Per-transaction record of which working copy shadows which stored account.
//! Pairings are keyed by account identifier, so re-reading an account inside
//! the same transaction always yields the same working copy.

use std::collections::btree_map::{BTreeMap, Entry};

use crate::domain::{Account, Balance};
use crate::store::RecordUpdate;

use super::TransactionId;

/// Private, mutable duplicate of an account, paired with the snapshot it was taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    original: Account,
    copy: Account,
}

impl WorkingCopy {
    fn new(original: Account) -> Self {
        Self {
            copy: original.clone(),
            original,
        }
    }

    pub fn account_id(&self) -> &str {
        self.copy.account_id()
    }

    pub fn balance(&self) -> Balance {
        self.copy.balance()
    }

    pub fn is_blocked(&self) -> bool {
        self.copy.is_blocked()
    }

    pub fn set_balance(&mut self, balance: Balance) {
        self.copy.set_balance(balance);
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.copy.set_blocked(blocked);
    }

    /// Owned view of the copy's current values
    pub fn snapshot(&self) -> Account {
        self.copy.clone()
    }

    /// The record as it was when first read in this transaction
    pub fn original(&self) -> &Account {
        &self.original
    }

    /// Store version the copy was taken at
    pub fn base_version(&self) -> u64 {
        self.original.version()
    }

    pub fn is_modified(&self) -> bool {
        self.copy.balance() != self.original.balance()
            || self.copy.is_blocked() != self.original.is_blocked()
    }

    pub(crate) fn to_update(&self, check_version: bool) -> RecordUpdate {
        RecordUpdate {
            account_id: self.account_id().to_string(),
            balance: self.copy.balance(),
            blocked: self.copy.is_blocked(),
            expected_version: check_version.then(|| self.base_version()),
        }
    }
}

/// Working copies registered during one transaction
#[derive(Debug)]
pub struct IsolationContext {
    transaction_id: TransactionId,
    copies: BTreeMap<String, WorkingCopy>,
}

impl IsolationContext {
    pub fn new(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            copies: BTreeMap::new(),
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Previously registered copy for this account
    pub fn get_mut(&mut self, account_id: &str) -> Option<&mut WorkingCopy> {
        self.copies.get_mut(account_id)
    }

    /// Register a copy of `original`, or return the existing one if the
    /// account was already read in this transaction.
    pub fn register(&mut self, original: Account) -> &mut WorkingCopy {
        match self.copies.entry(original.account_id().to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(WorkingCopy::new(original)),
        }
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.copies.contains_key(account_id)
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Working copies in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &WorkingCopy> {
        self.copies.values()
    }

    /// Store updates for every pairing, in identifier order
    pub(crate) fn updates(&self, check_versions: bool) -> Vec<RecordUpdate> {
        self.copies
            .values()
            .map(|copy| copy.to_update(check_versions))
            .collect()
    }
}
