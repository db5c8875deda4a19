//! In-memory document store
//!
//! Implements every store trait from [`crate::core::traits`] over process
//! memory. Used by the CLI and by the tests; a deployment against a remote
//! document database provides its own implementations of the same traits.

pub mod accounts;
pub mod collection;
pub mod requests;
pub mod transactions;

pub use accounts::MemoryAccountStore;
pub use collection::Collection;
pub use requests::MemoryRequestStore;
pub use transactions::{ChangeLog, MemoryTransactionStore};
