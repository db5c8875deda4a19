//! Store collaborator traits
//!
//! The engine talks to its document store only through these traits, so an
//! in-memory store (see [`crate::store`]) and a remote document database are
//! interchangeable. Every call may block on I/O; implementations report loss
//! of connectivity as [`PaymentError::StoreUnavailable`].

use crate::types::{
    Account, IdentifierField, PaymentError, RequestId, Transaction, TransactionId,
    TransactionRequest, TransactionUpdate,
};

/// Closure run inside an account-store transaction
pub type AccountWork<'a> =
    dyn FnMut(&mut dyn AccountTransaction) -> Result<(), PaymentError> + 'a;

/// The `accounts` collection
pub trait AccountStore: Send + Sync {
    /// First account whose `field` equals `value`
    ///
    /// Uniqueness of identifiers is not enforced by the store; when several
    /// accounts match, which one is "first" is up to the implementation.
    fn find_first(
        &self,
        field: IdentifierField,
        value: &str,
    ) -> Result<Option<Account>, PaymentError>;

    /// Account by canonical account number
    fn get(&self, account_number: &str) -> Result<Option<Account>, PaymentError>;

    /// Run `work` as one atomic read-modify-write unit
    ///
    /// Reads inside `work` observe its own staged writes. Staged writes are
    /// committed together only if `work` returns `Ok`; on `Err` nothing is
    /// written and the error is returned unchanged. No other transaction may
    /// interleave with the accounts it touches.
    fn run_transaction(&self, work: &mut AccountWork<'_>) -> Result<(), PaymentError>;
}

/// View of the account store inside [`AccountStore::run_transaction`]
pub trait AccountTransaction {
    fn get(&mut self, account_number: &str) -> Result<Option<Account>, PaymentError>;

    /// Stage a full-record write
    fn put(&mut self, account: Account);
}

/// The `transaction` collection
///
/// List methods must return records in a stable order (creation order) so
/// that offset pagination is repeatable across calls.
pub trait TransactionStore: Send + Sync {
    /// Persist a new record and return the store-generated id
    ///
    /// The id is NOT written into the record; callers write it back with
    /// [`TransactionUpdate::Id`].
    fn insert(&self, transaction: Transaction) -> Result<TransactionId, PaymentError>;

    fn get(&self, id: &str) -> Result<Option<Transaction>, PaymentError>;

    /// Apply a single-field update; fails `NotFound` for an unknown id
    fn update(&self, id: &str, update: TransactionUpdate) -> Result<(), PaymentError>;

    fn find_all(&self) -> Result<Vec<(TransactionId, Transaction)>, PaymentError>;

    /// Records whose sender id equals `user`
    fn find_by_sender(&self, user: &str) -> Result<Vec<(TransactionId, Transaction)>, PaymentError>;

    /// Records whose receiver id equals `user`
    fn find_by_receiver(
        &self,
        user: &str,
    ) -> Result<Vec<(TransactionId, Transaction)>, PaymentError>;
}

/// The `TransactionRequest` collection
pub trait RequestStore: Send + Sync {
    /// Persist a new request and return the store-generated id
    fn insert(&self, request: TransactionRequest) -> Result<RequestId, PaymentError>;

    /// Write the store-generated id back onto the record
    fn set_id(&self, id: &str) -> Result<(), PaymentError>;

    fn get(&self, id: &str) -> Result<Option<TransactionRequest>, PaymentError>;

    /// Remove a request; fails `NotFound` if it was already removed
    fn delete(&self, id: &str) -> Result<(), PaymentError>;
}
