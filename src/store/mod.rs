//! Store module
//!
//! The single source of truth for account records.

mod account_store;

pub use account_store::{AccountStore, RecordUpdate};
