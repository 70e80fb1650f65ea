//! Handlers module
//!
//! The account service and the operations it composes into units of work.

mod account_service;
mod commands;
pub mod operations;


pub use account_service::AccountService;
pub use commands::*;
