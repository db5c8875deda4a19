//! Transaction processing engine
//!
//! `PaymentEngine` wires the Account Directory, the Ledger and the lock
//! registry to the transaction and request stores. Its public operations
//! live next to the component they implement:
//!
//! - [`initiate`](PaymentEngine::initiate) in `lifecycle`
//! - [`make_request`](PaymentEngine::make_request) and
//!   [`act`](PaymentEngine::act) in `requests`
//! - [`get_by_id`](PaymentEngine::get_by_id) and
//!   [`list`](PaymentEngine::list) in `query`
//!
//! All operations are synchronous and may block on store I/O. The engine is
//! `Send + Sync`; share it behind an `Arc` across request-handling threads.

use crate::config::PaymentLimits;
use crate::core::directory::{AccountDirectory, ResolvedAccounts};
use crate::core::ledger::Ledger;
use crate::core::limits::LimitPolicy;
use crate::core::lock_registry::LockRegistry;
use crate::core::traits::{AccountStore, RequestStore, TransactionStore};
use crate::types::{
    PaymentError, Transaction, TransactionId, TransactionStatus, TransactionUpdate,
};
use std::sync::Arc;
use tracing::error;

pub struct PaymentEngine {
    pub(crate) directory: AccountDirectory,
    pub(crate) ledger: Ledger,
    pub(crate) transactions: Arc<dyn TransactionStore>,
    pub(crate) requests: Arc<dyn RequestStore>,
    pub(crate) locks: LockRegistry,
}

impl PaymentEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        requests: Arc<dyn RequestStore>,
        limits: PaymentLimits,
    ) -> Self {
        PaymentEngine {
            directory: AccountDirectory::new(Arc::clone(&accounts)),
            ledger: Ledger::new(accounts, LimitPolicy::new(limits)),
            transactions,
            requests,
            locks: LockRegistry::new(),
        }
    }

    pub fn lock_registry(&self) -> &LockRegistry {
        &self.locks
    }

    /// Resolve both parties, then persist `transaction` and write its id back
    ///
    /// Nothing is written if resolution fails. `receiver_id`, when given, is
    /// written back after the id.
    pub(crate) fn record_pending(
        &self,
        transaction: Transaction,
        receiver_id: Option<&str>,
    ) -> Result<(TransactionId, ResolvedAccounts), PaymentError> {
        let accounts = self.directory.resolve_pair(
            transaction.sender_payment_method,
            transaction.receiver_payment_method,
            &transaction.sender_payment_details,
            &transaction.receiver_payment_details,
        )?;

        let id = self.transactions.insert(transaction)?;
        self.transactions
            .update(&id, TransactionUpdate::Id(id.clone()))?;
        if let Some(receiver) = receiver_id {
            self.transactions
                .update(&id, TransactionUpdate::ReceiverId(receiver.to_string()))?;
        }
        Ok((id, accounts))
    }

    pub(crate) fn set_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<(), PaymentError> {
        self.transactions
            .update(id, TransactionUpdate::Status(status))
            .inspect_err(|e| {
                error!(transaction_id = id, %status, error = %e, "failed to update transaction status");
            })
    }

    /// Mark `id` as failed and hand back the error to propagate
    ///
    /// If the status write itself fails, both errors are returned together.
    pub(crate) fn fail_transaction(&self, id: &str, cause: PaymentError) -> PaymentError {
        match self.set_status(id, TransactionStatus::Fail) {
            Ok(()) => cause,
            Err(status_error) => PaymentError::status_update_failed(id, cause, status_error),
        }
    }
}
