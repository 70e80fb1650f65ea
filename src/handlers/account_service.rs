//! Account Service
//!
//! Public account operations. Every mutation runs as one unit of work on a
//! fresh transaction manager and is committed right after it succeeds.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Account, Amount, Balance, LedgerError, LedgerResult};
use crate::store::AccountStore;
use crate::transaction::{AccountRepository, CommitPolicy, DirectRepository, TransactionManager};

use super::operations::{credit, debit, set_blocked_status};
use super::{CreateAccountCommand, TransferCommand, TransferResult};

/// Service for account creation, lookup, transfers and blocking
#[derive(Debug, Clone)]
pub struct AccountService {
    store: Arc<AccountStore>,
    policy: CommitPolicy,
}

impl AccountService {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self {
            store,
            policy: CommitPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// A manager scoped to a single service call
    pub fn transaction_manager(&self) -> TransactionManager {
        TransactionManager::new(self.store.clone()).with_policy(self.policy)
    }

    /// Open a new account
    ///
    /// # Errors
    /// - `LedgerError::InvalidAmount` for a negative opening balance
    /// - `LedgerError::DuplicateEntity` if the identifier is taken
    pub fn create_account(&self, command: CreateAccountCommand) -> LedgerResult<Account> {
        let balance = Balance::new(command.balance)?;
        let account = Account::new(command.account_id, balance).with_blocked(command.blocked);

        self.store.create(account.clone())?;
        tracing::info!(account_id = %account.account_id(), "Account {} Created", account.account_id());
        Ok(account)
    }

    /// Current state of an account, read outside any transaction
    pub fn get_account(&self, account_id: &str) -> Option<Account> {
        DirectRepository::new(&self.store).get_account(account_id)
    }

    /// Debit `account_from` and credit `account_to` as one unit of work.
    ///
    /// Either both balances change or neither does.
    pub fn amount_transfer(&self, command: TransferCommand) -> LedgerResult<TransferResult> {
        let amount = Amount::new(command.amount)?;
        let mut manager = self.transaction_manager();

        manager.run_in_transaction(|repository| {
            debit(repository, &command.account_from, &amount)?;
            credit(repository, &command.account_to, &amount)?;
            Ok::<(), LedgerError>(())
        })?;
        manager.commit()?;

        tracing::info!(
            account_from = %command.account_from,
            account_to = %command.account_to,
            amount = %amount,
            "Transfer completed"
        );

        Ok(TransferResult {
            account_from: command.account_from,
            account_to: command.account_to,
            amount: amount.value(),
            completed_at: Utc::now(),
        })
    }

    /// Block an account from sending or receiving money
    pub fn block_account(&self, account_id: &str) -> LedgerResult<()> {
        self.change_blocked_status(account_id, true)
    }

    /// Lift a block
    pub fn unblock_account(&self, account_id: &str) -> LedgerResult<()> {
        self.change_blocked_status(account_id, false)
    }

    fn change_blocked_status(&self, account_id: &str, blocked: bool) -> LedgerResult<()> {
        let mut manager = self.transaction_manager();

        manager.run_in_transaction(|repository| {
            set_blocked_status(repository, account_id, blocked).map(|_| ())
        })?;
        manager.commit()?;

        tracing::info!(account_id = %account_id, blocked, "Account status changed");
        Ok(())
    }
}
