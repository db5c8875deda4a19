//! Account Directory
//!
//! Resolves payment-method identifiers (UPI handle, card id, bank account
//! number) to canonical account numbers.
//!
//! Only the sender/receiver method pairs listed in [`Route`] are supported.
//! The table is deliberately not symmetric: `BANK -> UPI` or
//! `CREDIT_CARD -> BANK` are rejected rather than resolved.

use crate::core::traits::AccountStore;
use crate::types::{AccountNumber, PaymentDetails, PaymentError, PaymentMethod};
use std::sync::Arc;
use tracing::{debug, warn};

/// Supported (sender method, receiver method) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    UpiToUpi,
    UpiToBank,
    CreditCardToUpi,
    BankToBank,
}

impl Route {
    #[cfg(test)]
    const ALL: [Route; 4] = [
        Route::UpiToUpi,
        Route::UpiToBank,
        Route::CreditCardToUpi,
        Route::BankToBank,
    ];

    pub fn for_pair(sender: PaymentMethod, receiver: PaymentMethod) -> Result<Route, PaymentError> {
        use PaymentMethod::*;
        match (sender, receiver) {
            (Upi, Upi) => Ok(Route::UpiToUpi),
            (Upi, Bank) => Ok(Route::UpiToBank),
            (CreditCard, Upi) => Ok(Route::CreditCardToUpi),
            (Bank, Bank) => Ok(Route::BankToBank),
            (Upi, CreditCard)
            | (CreditCard, CreditCard)
            | (CreditCard, Bank)
            | (Bank, Upi)
            | (Bank, CreditCard) => Err(PaymentError::unsupported_combination(
                sender.as_str(),
                receiver.as_str(),
            )),
        }
    }

    pub fn methods(self) -> (PaymentMethod, PaymentMethod) {
        match self {
            Route::UpiToUpi => (PaymentMethod::Upi, PaymentMethod::Upi),
            Route::UpiToBank => (PaymentMethod::Upi, PaymentMethod::Bank),
            Route::CreditCardToUpi => (PaymentMethod::CreditCard, PaymentMethod::Upi),
            Route::BankToBank => (PaymentMethod::Bank, PaymentMethod::Bank),
        }
    }
}

/// Canonical account numbers for both parties of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccounts {
    pub sender: AccountNumber,
    pub receiver: AccountNumber,
}

#[derive(Clone)]
pub struct AccountDirectory {
    store: Arc<dyn AccountStore>,
}

impl AccountDirectory {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Account number of the first account whose `method` identifier is `identifier`
    pub fn resolve(
        &self,
        method: PaymentMethod,
        identifier: &str,
    ) -> Result<AccountNumber, PaymentError> {
        let field = method.identifier_field();
        match self.store.find_first(field, identifier)? {
            Some(account) => {
                debug!(%field, account = %account.account_number, "identifier resolved");
                Ok(account.account_number)
            }
            None => {
                warn!(%field, "no account matches identifier");
                Err(PaymentError::account_not_found(format!("{field}={identifier}")))
            }
        }
    }

    /// Resolve both parties, dispatching on the method pair
    pub fn resolve_pair(
        &self,
        sender_method: PaymentMethod,
        receiver_method: PaymentMethod,
        sender_details: &PaymentDetails,
        receiver_details: &PaymentDetails,
    ) -> Result<ResolvedAccounts, PaymentError> {
        let route = Route::for_pair(sender_method, receiver_method).inspect_err(|_| {
            warn!(
                sender_method = %sender_method,
                receiver_method = %receiver_method,
                "invalid payment method combination"
            );
        })?;
        let (sender_method, receiver_method) = route.methods();

        let sender = self.resolve(sender_method, sender_details.identifier_for(sender_method)?)?;
        let receiver = self.resolve(
            receiver_method,
            receiver_details.identifier_for(receiver_method)?,
        )?;
        Ok(ResolvedAccounts { sender, receiver })
    }
}
