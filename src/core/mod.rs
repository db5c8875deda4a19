//! Core business logic module
//!
//! This module contains the payment processing components:
//! - `traits` - Store abstractions the engine runs against
//! - `directory` - Account Directory (identifier to account resolution)
//! - `limits` - Per-method maximum amounts
//! - `ledger` - Atomic debit/credit between two accounts
//! - `lock_registry` - Per-request mutual exclusion
//! - `engine` - `PaymentEngine`, which ties the above to the stores
//! - `lifecycle`, `requests`, `query` - the engine's public operations

pub mod directory;
pub mod engine;
pub mod ledger;
pub mod lifecycle;
pub mod limits;
pub mod lock_registry;
pub mod query;
pub mod requests;
pub mod traits;

pub use directory::{AccountDirectory, ResolvedAccounts, Route};
pub use engine::PaymentEngine;
pub use ledger::{Ledger, TransferReceipt};
pub use limits::LimitPolicy;
pub use lock_registry::{KeyGuard, LockRegistry};
pub use query::{PageRequest, TransactionPage};
pub use traits::{AccountStore, AccountTransaction, RequestStore, TransactionStore};
