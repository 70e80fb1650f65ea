//! Transaction module
//!
//! In-memory transactional execution: isolation contexts holding working
//! copies, the intercepting repository that produces them, and the manager
//! that commits or discards them.

mod context;
mod manager;
mod repository;
mod state;

pub use context::{IsolationContext, WorkingCopy};
pub use manager::{CommitPolicy, TransactionManager};
pub use repository::{AccountRepository, DirectRepository, TransactionalRepository};
pub use state::{TransactionId, TransactionState};
