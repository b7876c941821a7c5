//! Transactional storage for the Leave Ledger Engine.
//!
//! [`MemoryStore`] is an in-memory document store with optimistic
//! concurrency; [`TxnExecutor`] wraps units of work in retried atomic
//! transactions. The ledger logic never holds live references into the
//! store: it works with ids and re-fetches inside each transaction attempt.

mod executor;
mod memory;

pub use executor::TxnExecutor;
pub use memory::{MemoryStore, Transaction};
