//! account_ledger Library
//!
//! In-memory account ledger whose multi-step mutations run through an
//! atomic transaction engine: units of work operate on private working
//! copies that are either committed onto the store together or discarded.

pub mod api;
pub mod domain;
pub mod handlers;
pub mod notification;
pub mod store;
pub mod transaction;

pub mod config;
mod error;

pub use config::Config;
pub use domain::{Account, Amount, AmountError, Balance, LedgerError, LedgerResult};
pub use error::{AppError, AppResult, ErrorResponse};
pub use store::AccountStore;
pub use transaction::{CommitPolicy, TransactionManager, TransactionState};
