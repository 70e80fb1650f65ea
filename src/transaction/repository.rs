//! Account repositories
//!
//! Read access to accounts comes in two flavours behind one trait: a direct
//! passthrough to the store for reads outside a transaction, and the
//! transactional repository that intercepts every read, hands out a private
//! working copy and registers it in the active isolation context.

use crate::domain::Account;
use crate::store::AccountStore;

use super::{IsolationContext, TransactionId, WorkingCopy};

/// Read contract shared by the direct and the transactional repository
pub trait AccountRepository {
    /// Current view of an account, or `None` if it does not exist.
    ///
    /// The returned value is always an owned snapshot; mutating it never
    /// touches the store.
    fn get_account(&mut self, account_id: &str) -> Option<Account>;
}

/// Non-transactional passthrough: reads the live record
#[derive(Debug, Clone, Copy)]
pub struct DirectRepository<'a> {
    store: &'a AccountStore,
}

impl<'a> DirectRepository<'a> {
    pub fn new(store: &'a AccountStore) -> Self {
        Self { store }
    }
}

impl AccountRepository for DirectRepository<'_> {
    fn get_account(&mut self, account_id: &str) -> Option<Account> {
        self.store.get(account_id)
    }
}

/// Repository handed to a unit of work while a transaction is active
#[derive(Debug)]
pub struct TransactionalRepository<'a> {
    store: &'a AccountStore,
    context: &'a mut IsolationContext,
}

impl<'a> TransactionalRepository<'a> {
    pub(crate) fn new(store: &'a AccountStore, context: &'a mut IsolationContext) -> Self {
        Self { store, context }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.context.transaction_id()
    }

    /// Working copy of an account.
    ///
    /// The first read copies the stored record into the isolation context;
    /// later reads of the same identifier return that same copy. Unknown
    /// accounts register nothing.
    pub fn checkout(&mut self, account_id: &str) -> Option<&mut WorkingCopy> {
        if !self.context.contains(account_id) {
            let original = self.store.get(account_id)?;
            tracing::debug!(
                transaction_id = %self.context.transaction_id(),
                account_id = %account_id,
                version = original.version(),
                "Working copy registered"
            );
            self.context.register(original);
        }
        self.context.get_mut(account_id)
    }

    /// Number of working copies registered so far
    pub fn registered(&self) -> usize {
        self.context.len()
    }
}

impl AccountRepository for TransactionalRepository<'_> {
    fn get_account(&mut self, account_id: &str) -> Option<Account> {
        self.checkout(account_id).map(|copy| copy.snapshot())
    }
}
