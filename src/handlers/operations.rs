//! Account operations
//!
//! Building blocks for units of work. Each one reads through the
//! transactional repository, checks the account rules and mutates the
//! working copy. None of them commits or rolls back.

use crate::domain::{Account, Amount, LedgerError, LedgerResult};
use crate::transaction::{TransactionalRepository, WorkingCopy};

fn checkout<'r>(
    repository: &'r mut TransactionalRepository<'_>,
    account_id: &str,
) -> LedgerResult<&'r mut WorkingCopy> {
    repository
        .checkout(account_id)
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
}

/// Withdraw `amount` from an account.
///
/// Checks run in a fixed order: existence, balance, then blocked flag.
pub fn debit(
    repository: &mut TransactionalRepository<'_>,
    account_id: &str,
    amount: &Amount,
) -> LedgerResult<Account> {
    let account = checkout(repository, account_id)?;

    if !account.balance().is_sufficient_for(amount) {
        return Err(LedgerError::insufficient_balance(account_id));
    }
    if account.is_blocked() {
        return Err(LedgerError::AccountBlocked(account_id.to_string()));
    }

    let balance = account.balance().debit(amount)?;
    account.set_balance(balance);
    Ok(account.snapshot())
}

/// Deposit `amount` into an account
pub fn credit(
    repository: &mut TransactionalRepository<'_>,
    account_id: &str,
    amount: &Amount,
) -> LedgerResult<Account> {
    let account = checkout(repository, account_id)?;

    if account.is_blocked() {
        return Err(LedgerError::AccountBlocked(account_id.to_string()));
    }

    let balance = account.balance().credit(amount)?;
    account.set_balance(balance);
    Ok(account.snapshot())
}

/// Set or clear the blocked flag
pub fn set_blocked_status(
    repository: &mut TransactionalRepository<'_>,
    account_id: &str,
    blocked: bool,
) -> LedgerResult<Account> {
    let account = checkout(repository, account_id)?;
    account.set_blocked(blocked);
    Ok(account.snapshot())
}
