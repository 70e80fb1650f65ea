//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod amount;
pub mod error;

pub use account::Account;
pub use amount::{Amount, AmountError, Balance};
pub use error::{LedgerError, LedgerResult};
