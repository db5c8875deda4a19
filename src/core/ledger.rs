//! Ledger Transfer
//!
//! Moves `amount` from one account to another. The debit and the credit are
//! staged inside a single [`AccountStore::run_transaction`] call, so a
//! failure at any step (missing receiver, overflow) leaves both balances
//! exactly as they were.
//!
//! Order of checks:
//! 1. amount is positive, method has a limit, amount is within it
//! 2. sender exists and holds at least `amount`
//! 3. sender is debited, receiver exists and is credited

use crate::core::limits::LimitPolicy;
use crate::core::traits::AccountStore;
use crate::types::{PaymentError, PaymentMethod};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Balances after a committed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub sender_balance: Decimal,
    pub receiver_balance: Decimal,
}

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn AccountStore>,
    limits: LimitPolicy,
}

impl Ledger {
    pub fn new(store: Arc<dyn AccountStore>, limits: LimitPolicy) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &LimitPolicy {
        &self.limits
    }

    /// Atomically debit `sender` and credit `receiver`
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `amount` is not positive
    /// - `InvalidPaymentMethod` / `LimitExceeded` from the limit policy
    /// - `NotFound` if either account is missing
    /// - `InsufficientFunds` if the sender balance is below `amount`
    ///
    /// On any error no balance is modified.
    pub fn transfer(
        &self,
        sender: &str,
        receiver: &str,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<TransferReceipt, PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::validation(format!(
                "transfer amount must be greater than 0, got {amount}"
            )));
        }
        self.limits.check(method, amount).inspect_err(|e| {
            warn!(%method, %amount, error = %e, "transfer rejected by limit policy");
        })?;

        let mut receipt = None;
        self.store.run_transaction(&mut |txn| {
            let mut debit = txn
                .get(sender)?
                .ok_or_else(|| PaymentError::account_not_found(sender))?;
            if debit.balance < amount {
                return Err(PaymentError::insufficient_funds(
                    sender,
                    debit.balance,
                    amount,
                ));
            }
            let now = Utc::now();
            debit.balance -= amount;
            debit.updated_at = Some(now);
            txn.put(debit);

            // Read after the staged debit so a self-transfer nets to zero.
            let mut credit = txn
                .get(receiver)?
                .ok_or_else(|| PaymentError::account_not_found(receiver))?;
            credit.balance = credit.balance.checked_add(amount).ok_or_else(|| {
                PaymentError::validation(format!("balance overflow crediting account {receiver}"))
            })?;
            credit.updated_at = Some(now);
            let receiver_balance = credit.balance;
            txn.put(credit);

            let sender_balance = txn
                .get(sender)?
                .map(|account| account.balance)
                .unwrap_or_default();
            receipt = Some(TransferReceipt {
                sender_balance,
                receiver_balance,
            });
            Ok(())
        })
        .inspect_err(|e| {
            warn!(sender, receiver, %amount, %method, error = %e, "transfer aborted");
        })?;

        let receipt = receipt.ok_or_else(|| {
            PaymentError::store_unavailable("account transaction committed without running")
        })?;
        info!(sender, receiver, %amount, %method, "transfer committed");
        Ok(receipt)
    }
}
