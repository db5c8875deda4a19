//! Transaction Lifecycle
//!
//! A sender-initiated transfer is persisted as `pending`, settled through
//! the ledger, and finished as `success` or `fail`:
//!
//! ```text
//! (absent) --> pending --transfer ok--> success
//!                      --transfer err-> fail
//! ```

use crate::core::engine::PaymentEngine;
use crate::types::{
    PaymentError, Transaction, TransactionId, TransactionStatus, TransferCommand,
};
use chrono::Utc;
use tracing::{info, warn};

impl PaymentEngine {
    /// Record and settle a transfer, returning the new transaction id
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for malformed input (nothing is written)
    /// - resolution errors (`UnsupportedMethodCombination`, `NotFound`);
    ///   nothing is written
    /// - any ledger error, after the transaction has been marked `fail`
    pub fn initiate(&self, command: TransferCommand) -> Result<TransactionId, PaymentError> {
        command.validate().inspect_err(|e| {
            warn!(sender = %command.sender_id, error = %e, "transfer rejected");
        })?;

        let transaction = Transaction {
            id: None,
            sender_id: command.sender_id.clone(),
            receiver_id: None,
            amount: command.amount,
            sender_payment_method: command.payment_method,
            receiver_payment_method: command.receiving_method,
            sender_payment_details: command.sender_payment_details,
            receiver_payment_details: command.receiver_payment_details,
            status: TransactionStatus::Pending,
            timestamp: Utc::now(),
            transaction_type: command.transaction_type,
            action_by: Some(command.sender_id.clone()),
        };

        let (id, accounts) = self
            .record_pending(transaction, command.receiver_id.as_deref())
            .inspect_err(|e| {
                warn!(sender = %command.sender_id, error = %e, "failed to record transfer");
            })?;

        if let Err(cause) = self.ledger.transfer(
            &accounts.sender,
            &accounts.receiver,
            command.amount,
            command.payment_method,
        ) {
            warn!(transaction_id = %id, error = %cause, "payment processing failed, marking transaction failed");
            return Err(self.fail_transaction(&id, cause));
        }

        self.set_status(&id, TransactionStatus::Success)?;
        info!(transaction_id = %id, amount = %command.amount, "transfer succeeded");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PaymentLimits;
    use crate::core::engine::PaymentEngine;
    use crate::core::traits::TransactionStore;
    use crate::store::{MemoryAccountStore, MemoryRequestStore, MemoryTransactionStore};
    use crate::types::{
        Account, PaymentDetails, PaymentError, PaymentMethod, TransactionStatus,
        TransactionType, TransferCommand,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Fixture {
        accounts: Arc<MemoryAccountStore>,
        transactions: Arc<MemoryTransactionStore>,
        engine: PaymentEngine,
    }

    fn fixture() -> Fixture {
        let accounts = Arc::new(MemoryAccountStore::with_accounts([
            Account::new("ACC-1", dec!(500)).with_upi("alice@upi"),
            Account::new("ACC-2", dec!(100)).with_upi("bob@upi"),
        ]));
        let transactions = Arc::new(MemoryTransactionStore::new());
        let engine = PaymentEngine::new(
            accounts.clone(),
            transactions.clone(),
            Arc::new(MemoryRequestStore::new()),
            PaymentLimits::new().with_limit("UPI", dec!(1000)),
        );
        Fixture {
            accounts,
            transactions,
            engine,
        }
    }

    fn transfer(amount: Decimal) -> TransferCommand {
        TransferCommand {
            sender_id: "alice".to_string(),
            receiver_id: Some("bob".to_string()),
            amount,
            payment_method: PaymentMethod::Upi,
            receiving_method: PaymentMethod::Upi,
            transaction_type: TransactionType::Payment,
            sender_payment_details: PaymentDetails::upi("alice@upi"),
            receiver_payment_details: PaymentDetails::upi("bob@upi"),
        }
    }

    #[test]
    fn test_successful_transfer_records_success() {
        let f = fixture();

        let id = f.engine.initiate(transfer(dec!(200))).unwrap();

        let tx = f.transactions.get(&id).unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Success);
        assert_eq!(tx.id.as_deref(), Some(id.as_str()));
        assert_eq!(tx.receiver_id.as_deref(), Some("bob"));
        assert_eq!(tx.action_by.as_deref(), Some("alice"));
        assert_eq!(f.accounts.balance("ACC-1"), Some(dec!(300)));
        assert_eq!(f.accounts.balance("ACC-2"), Some(dec!(300)));
    }

    #[test]
    fn test_over_limit_marks_transaction_failed() {
        let f = fixture();

        let result = f.engine.initiate(transfer(dec!(1200)));

        assert_eq!(
            result,
            Err(PaymentError::limit_exceeded("UPI", dec!(1000), dec!(1200)))
        );
        let (_, tx) = f.transactions.find_all().unwrap().pop().unwrap();
        assert_eq!(tx.status, TransactionStatus::Fail);
        assert_eq!(f.accounts.balance("ACC-1"), Some(dec!(500)));
        assert_eq!(f.accounts.balance("ACC-2"), Some(dec!(100)));
    }

    #[test]
    fn test_resolution_failure_writes_nothing() {
        let f = fixture();
        let mut command = transfer(dec!(10));
        command.receiver_payment_details = PaymentDetails::upi("ghost@upi");

        let result = f.engine.initiate(command);

        assert!(matches!(result, Err(PaymentError::NotFound { .. })));
        assert!(f.transactions.is_empty());
    }

    #[test]
    fn test_invalid_command_writes_nothing() {
        let f = fixture();

        let result = f.engine.initiate(transfer(dec!(-1)));

        assert!(matches!(result, Err(PaymentError::ValidationFailed { .. })));
        assert!(f.transactions.is_empty());
    }

    #[test]
    fn test_receiver_not_written_when_absent() {
        let f = fixture();
        let mut command = transfer(dec!(10));
        command.receiver_id = None;

        let id = f.engine.initiate(command).unwrap();

        assert_eq!(f.transactions.get(&id).unwrap().unwrap().receiver_id, None);
    }
}
