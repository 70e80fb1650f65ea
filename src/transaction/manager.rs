//! Transaction Manager
//!
//! Runs a unit of work against working copies and finalizes it. A manager
//! owns at most one isolation context, so one manager is created per logical
//! flow (service call, HTTP request) and never shared between flows.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{LedgerError, LedgerResult};
use crate::store::AccountStore;

use super::{
    AccountRepository, DirectRepository, IsolationContext, TransactionId, TransactionState,
    TransactionalRepository,
};

/// How commit treats records changed by another transaction after they were read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// Write copied values unconditionally; a later commit overwrites an earlier one
    #[default]
    LastWriterWins,

    /// Reject the commit with `VersionConflict` if any record changed since it was read
    Optimistic,
}

impl FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-writer-wins" | "lww" => Ok(Self::LastWriterWins),
            "optimistic" => Ok(Self::Optimistic),
            other => Err(format!("unknown commit policy: {}", other)),
        }
    }
}

impl fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitPolicy::LastWriterWins => write!(f, "last-writer-wins"),
            CommitPolicy::Optimistic => write!(f, "optimistic"),
        }
    }
}

/// Transaction manager for one logical flow
pub struct TransactionManager {
    store: Arc<AccountStore>,
    policy: CommitPolicy,
    state: TransactionState,
    context: Option<IsolationContext>,
    last_outcome: Option<TransactionState>,
}

impl TransactionManager {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self {
            store,
            policy: CommitPolicy::default(),
            state: TransactionState::Idle,
            context: None,
            last_outcome: None,
        }
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// How the most recent transaction ended (`Committed` or `RolledBack`)
    pub fn last_outcome(&self) -> Option<TransactionState> {
        self.last_outcome
    }

    pub fn current_transaction(&self) -> Option<TransactionId> {
        self.context.as_ref().map(IsolationContext::transaction_id)
    }

    /// Working copies waiting for commit
    pub fn pending_copies(&self) -> usize {
        self.context.as_ref().map_or(0, IsolationContext::len)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a transaction and run `unit_of_work` against working copies.
    ///
    /// On success the transaction stays `Active` until [`commit`](Self::commit)
    /// or [`rollback`](Self::rollback) is called. On failure every working copy
    /// is discarded, the store is left untouched and the error is returned as is.
    ///
    /// # Errors
    /// - `LedgerError::TransactionAlreadyActive` if a transaction is pending
    /// - whatever `unit_of_work` returns
    pub fn run_in_transaction<T, E, F>(&mut self, unit_of_work: F) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionalRepository<'_>) -> Result<T, E>,
        E: From<LedgerError>,
    {
        if self.state.is_active() {
            tracing::warn!(
                transaction_id = ?self.current_transaction(),
                "Attempted to begin a transaction while another is active"
            );
            return Err(LedgerError::TransactionAlreadyActive.into());
        }

        let mut context = IsolationContext::new(TransactionId::new());
        let transaction_id = context.transaction_id();
        self.state = TransactionState::Active;
        self.last_outcome = None;
        tracing::debug!(transaction_id = %transaction_id, "Transaction started");

        let outcome = {
            let guard = UnwindGuard {
                state: &mut self.state,
                last_outcome: &mut self.last_outcome,
                transaction_id,
            };
            let mut repository = TransactionalRepository::new(&self.store, &mut context);
            let outcome = unit_of_work(&mut repository);
            guard.disarm();
            outcome
        };

        match outcome {
            Ok(value) => {
                self.context = Some(context);
                Ok(value)
            }
            Err(err) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    discarded = context.len(),
                    "Unit of work failed, transaction rolled back"
                );
                self.finish(TransactionState::RolledBack);
                Err(err)
            }
        }
    }

    /// Write every working copy back onto the store and end the transaction.
    ///
    /// All copies are applied under one store write lock, in identifier order.
    ///
    /// # Errors
    /// - `LedgerError::NoActiveTransaction` if nothing is pending
    /// - `LedgerError::VersionConflict` under [`CommitPolicy::Optimistic`]; the
    ///   transaction is rolled back and nothing is written
    pub fn commit(&mut self) -> LedgerResult<()> {
        let context = match (self.state, self.context.take()) {
            (TransactionState::Active, Some(context)) => context,
            (TransactionState::Active, None) => {
                self.finish(TransactionState::RolledBack);
                return Err(LedgerError::NoActiveTransaction);
            }
            _ => return Err(LedgerError::NoActiveTransaction),
        };

        let updates = context.updates(self.policy == CommitPolicy::Optimistic);
        match self.store.apply_all(&updates) {
            Ok(()) => {
                tracing::info!(
                    transaction_id = %context.transaction_id(),
                    pairs = updates.len(),
                    modified = context.iter().filter(|copy| copy.is_modified()).count(),
                    "Transaction committed"
                );
                self.finish(TransactionState::Committed);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    transaction_id = %context.transaction_id(),
                    error = %err,
                    "Commit rejected, transaction rolled back"
                );
                self.finish(TransactionState::RolledBack);
                Err(err)
            }
        }
    }

    /// Discard every working copy without touching the store.
    ///
    /// Does nothing if no transaction is active.
    pub fn rollback(&mut self) {
        if !self.state.is_active() {
            tracing::debug!("Rollback requested with no active transaction");
            return;
        }

        if let Some(context) = self.context.take() {
            tracing::info!(
                transaction_id = %context.transaction_id(),
                discarded = context.len(),
                "Transaction rolled back"
            );
        }
        self.finish(TransactionState::RolledBack);
    }

    /// Give `f` the repository matching the current state: transactional while
    /// a transaction is pending, a direct passthrough otherwise.
    pub fn with_repository<R>(&mut self, f: impl FnOnce(&mut dyn AccountRepository) -> R) -> R {
        match self.context.as_mut() {
            Some(context) => {
                let mut repository = TransactionalRepository::new(&self.store, context);
                f(&mut repository)
            }
            None => {
                let mut repository = DirectRepository::new(&self.store);
                f(&mut repository)
            }
        }
    }

    fn finish(&mut self, outcome: TransactionState) {
        self.context = None;
        self.last_outcome = Some(outcome);
        self.state = TransactionState::Idle;
    }
}

/// Resets the manager to `Idle` if the unit of work unwinds
struct UnwindGuard<'a> {
    state: &'a mut TransactionState,
    last_outcome: &'a mut Option<TransactionState>,
    transaction_id: TransactionId,
}

impl UnwindGuard<'_> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        tracing::warn!(
            transaction_id = %self.transaction_id,
            "Unit of work panicked, transaction rolled back"
        );
        *self.last_outcome = Some(TransactionState::RolledBack);
        *self.state = TransactionState::Idle;
    }
}

impl Drop for TransactionManager {
    fn drop(&mut self) {
        if self.state.is_active() {
            tracing::warn!(
                transaction_id = ?self.current_transaction(),
                discarded = self.pending_copies(),
                "Transaction manager dropped with an uncommitted transaction"
            );
        }
    }
}

impl fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionManager")
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("transaction_id", &self.current_transaction())
            .field("pending_copies", &self.pending_copies())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Balance};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::panic::{self, AssertUnwindSafe};

    fn store_with(accounts: &[(&str, Decimal)]) -> Arc<AccountStore> {
        let store = Arc::new(AccountStore::new());
        for (id, balance) in accounts {
            store
                .create(Account::new(*id, Balance::new(*balance).unwrap()))
                .unwrap();
        }
        store
    }

    fn set_balance(
        repo: &mut TransactionalRepository<'_>,
        id: &str,
        value: Decimal,
    ) -> LedgerResult<()> {
        let copy = repo
            .checkout(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        copy.set_balance(Balance::new(value)?);
        Ok(())
    }

    fn balance_of(store: &AccountStore, id: &str) -> Decimal {
        store.get(id).unwrap().balance().value()
    }

    #[test]
    fn test_commit_applies_working_copies() {
        let store = store_with(&[("a", dec!(1000)), ("b", dec!(1000))]);
        let mut manager = TransactionManager::new(store.clone());

        manager
            .run_in_transaction(|repo| {
                set_balance(repo, "a", dec!(0))?;
                set_balance(repo, "b", dec!(2000))
            })
            .unwrap();

        assert_eq!(manager.state(), TransactionState::Active);
        assert_eq!(manager.pending_copies(), 2);
        // Nothing visible before commit
        assert_eq!(balance_of(&store, "a"), dec!(1000));

        manager.commit().unwrap();

        assert_eq!(balance_of(&store, "a"), dec!(0));
        assert_eq!(balance_of(&store, "b"), dec!(2000));
        assert_eq!(manager.state(), TransactionState::Idle);
        assert_eq!(manager.last_outcome(), Some(TransactionState::Committed));
        assert!(manager.current_transaction().is_none());
    }

    #[test]
    fn test_failure_rolls_back_and_propagates() {
        let store = store_with(&[("a", dec!(1000))]);
        let mut manager = TransactionManager::new(store.clone());

        let err = manager
            .run_in_transaction(|repo| {
                set_balance(repo, "a", dec!(1))?;
                set_balance(repo, "ghost", dec!(1))
            })
            .unwrap_err();

        assert_eq!(err, LedgerError::AccountNotFound("ghost".into()));
        assert_eq!(balance_of(&store, "a"), dec!(1000));
        assert_eq!(manager.state(), TransactionState::Idle);
        assert_eq!(manager.last_outcome(), Some(TransactionState::RolledBack));
        assert_eq!(manager.commit(), Err(LedgerError::NoActiveTransaction));
    }

    #[test]
    fn test_panicking_unit_of_work_returns_to_idle() {
        let store = store_with(&[("a", dec!(1000))]);
        let mut manager = TransactionManager::new(store.clone());

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = manager.run_in_transaction(|repo| -> LedgerResult<()> {
                set_balance(repo, "a", dec!(1))?;
                panic!("unit of work blew up");
            });
        }));

        assert!(unwound.is_err());
        assert_eq!(manager.state(), TransactionState::Idle);
        assert_eq!(manager.last_outcome(), Some(TransactionState::RolledBack));
        assert_eq!(manager.pending_copies(), 0);
        assert_eq!(manager.commit(), Err(LedgerError::NoActiveTransaction));
        assert_eq!(balance_of(&store, "a"), dec!(1000));

        manager
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(500)))
            .unwrap();
        manager.commit().unwrap();
        assert_eq!(balance_of(&store, "a"), dec!(500));
    }

    #[test]
    fn test_begin_while_active_is_rejected() {
        let store = store_with(&[("a", dec!(10))]);
        let mut manager = TransactionManager::new(store.clone());

        manager
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(5)))
            .unwrap();
        let first = manager.current_transaction();

        let err = manager
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(0)))
            .unwrap_err();
        assert_eq!(err, LedgerError::TransactionAlreadyActive);

        // The pending transaction is unaffected
        assert_eq!(manager.current_transaction(), first);
        manager.commit().unwrap();
        assert_eq!(balance_of(&store, "a"), dec!(5));
    }

    #[test]
    fn test_commit_without_transaction() {
        let store = store_with(&[]);
        let mut manager = TransactionManager::new(store);
        assert_eq!(manager.commit(), Err(LedgerError::NoActiveTransaction));
    }

    #[test]
    fn test_explicit_rollback_leaves_store_unchanged() {
        let store = store_with(&[("a", dec!(10))]);
        let mut manager = TransactionManager::new(store.clone());

        manager
            .run_in_transaction(|repo| {
                let copy = repo.checkout("a").unwrap();
                copy.set_blocked(true);
                copy.set_balance(Balance::zero());
                Ok::<_, LedgerError>(())
            })
            .unwrap();
        manager.rollback();

        let account = store.get("a").unwrap();
        assert_eq!(account.balance().value(), dec!(10));
        assert!(!account.is_blocked());
        assert_eq!(manager.last_outcome(), Some(TransactionState::RolledBack));

        // Second rollback is a no-op
        manager.rollback();
        assert_eq!(manager.state(), TransactionState::Idle);
    }

    #[test]
    fn test_next_transaction_starts_clean() {
        let store = store_with(&[("a", dec!(10)), ("b", dec!(10))]);
        let mut manager = TransactionManager::new(store.clone());

        manager
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(1)))
            .unwrap();
        manager.commit().unwrap();

        manager
            .run_in_transaction(|repo| {
                assert_eq!(repo.registered(), 0);
                // Fresh copy reflects the committed value
                assert_eq!(repo.checkout("a").unwrap().balance().value(), dec!(1));
                Ok::<_, LedgerError>(())
            })
            .unwrap();
        assert_eq!(manager.pending_copies(), 1);
    }

    #[test]
    fn test_same_copy_within_unit_of_work() {
        let store = store_with(&[("a", dec!(10))]);
        let mut manager = TransactionManager::new(store);

        manager
            .run_in_transaction(|repo| {
                set_balance(repo, "a", dec!(3))?;
                let seen = repo.get_account("a").unwrap();
                assert_eq!(seen.balance().value(), dec!(3));
                Ok::<_, LedgerError>(())
            })
            .unwrap();
    }

    #[test]
    fn test_returns_unit_of_work_value() {
        let store = store_with(&[("a", dec!(10))]);
        let mut manager = TransactionManager::new(store);

        let balance = manager
            .run_in_transaction(|repo| {
                Ok::<_, LedgerError>(repo.checkout("a").map(|copy| copy.balance()))
            })
            .unwrap();
        assert_eq!(balance.map(|b| b.value()), Some(dec!(10)));
    }

    #[derive(Debug, PartialEq)]
    enum ServiceError {
        Ledger(LedgerError),
        Rejected,
    }

    impl From<LedgerError> for ServiceError {
        fn from(err: LedgerError) -> Self {
            Self::Ledger(err)
        }
    }

    #[test]
    fn test_foreign_errors_also_roll_back() {
        let store = store_with(&[("a", dec!(10))]);
        let mut manager = TransactionManager::new(store.clone());

        let err = manager
            .run_in_transaction(|repo| {
                set_balance(repo, "a", dec!(0))?;
                Err::<(), _>(ServiceError::Rejected)
            })
            .unwrap_err();

        assert_eq!(err, ServiceError::Rejected);
        assert_eq!(balance_of(&store, "a"), dec!(10));
    }

    #[test]
    fn test_last_writer_wins_overwrites_concurrent_commit() {
        let store = store_with(&[("a", dec!(100))]);
        let mut first = TransactionManager::new(store.clone());
        let mut second = TransactionManager::new(store.clone());

        first
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(90)))
            .unwrap();
        second
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(80)))
            .unwrap();

        first.commit().unwrap();
        second.commit().unwrap();

        assert_eq!(balance_of(&store, "a"), dec!(80));
    }

    #[test]
    fn test_optimistic_policy_detects_conflict() {
        let store = store_with(&[("a", dec!(100)), ("b", dec!(0))]);
        let mut first = TransactionManager::new(store.clone()).with_policy(CommitPolicy::Optimistic);
        let mut second =
            TransactionManager::new(store.clone()).with_policy(CommitPolicy::Optimistic);

        first
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(90)))
            .unwrap();
        second
            .run_in_transaction(|repo| {
                set_balance(repo, "a", dec!(80))?;
                set_balance(repo, "b", dec!(20))
            })
            .unwrap();

        first.commit().unwrap();
        let err = second.commit().unwrap_err();

        assert!(err.is_conflict_error());
        assert_eq!(balance_of(&store, "a"), dec!(90));
        assert_eq!(balance_of(&store, "b"), dec!(0));
        assert_eq!(second.last_outcome(), Some(TransactionState::RolledBack));
    }

    #[test]
    fn test_optimistic_read_only_copies_do_not_conflict() {
        let store = store_with(&[("a", dec!(100))]);
        let mut reader = TransactionManager::new(store.clone()).with_policy(CommitPolicy::Optimistic);
        let mut writer = TransactionManager::new(store.clone()).with_policy(CommitPolicy::Optimistic);

        reader
            .run_in_transaction(|repo| Ok::<_, LedgerError>(repo.get_account("a")))
            .unwrap();
        writer
            .run_in_transaction(|repo| Ok::<_, LedgerError>(repo.get_account("a")))
            .unwrap();

        reader.commit().unwrap();
        writer.commit().unwrap();
        assert_eq!(store.get("a").unwrap().version(), 0);
    }

    #[test]
    fn test_with_repository_follows_state() {
        let store = store_with(&[("a", dec!(10))]);
        let mut manager = TransactionManager::new(store);

        let seen = manager.with_repository(|repo| repo.get_account("a"));
        assert_eq!(seen.unwrap().balance().value(), dec!(10));
        assert_eq!(manager.pending_copies(), 0);

        manager
            .run_in_transaction(|repo| set_balance(repo, "a", dec!(2)))
            .unwrap();

        let seen = manager.with_repository(|repo| repo.get_account("a"));
        assert_eq!(seen.unwrap().balance().value(), dec!(2));
        manager.rollback();
    }

    #[test]
    fn test_commit_policy_parsing() {
        assert_eq!("optimistic".parse(), Ok(CommitPolicy::Optimistic));
        assert_eq!(" LWW ".parse(), Ok(CommitPolicy::LastWriterWins));
        assert_eq!(
            "last-writer-wins".parse::<CommitPolicy>().unwrap().to_string(),
            "last-writer-wins"
        );
        assert!("pessimistic".parse::<CommitPolicy>().is_err());
    }
}
