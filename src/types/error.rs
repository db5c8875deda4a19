//! Error types for the payflow engine
//!
//! Every failure the engine can surface to its caller is a `PaymentError`.
//! Variants carry the ids and amounts needed to diagnose a failure from the
//! log line alone; none of them carry payment-method secrets.
//!
//! # Error Categories
//!
//! - **Lookup**: a referenced account, transaction or request does not exist
//! - **Authorisation**: the acting user is not entitled to the action or role
//! - **Ledger**: insufficient funds, limit exceeded
//! - **Input**: unknown payment method, unsupported method pair, malformed input
//! - **Store**: the document store could not be reached, or a status write
//!   or request cleanup failed after the action itself went wrong

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the payflow engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// A referenced record does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record (account, transaction, request)
        entity: &'static str,
        /// The id or identifier that was looked up
        key: String,
    },

    /// The acting user may not perform this action
    #[error("user '{user}' is not authorised to {action}")]
    Unauthorized {
        /// The acting user id
        user: String,
        /// What was attempted
        action: String,
    },

    /// Sender balance is lower than the transfer amount
    ///
    /// No balance is mutated when this is returned.
    #[error(
        "Insufficient funds in account {account}: available {available}, requested {requested}"
    )]
    InsufficientFunds {
        account: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Amount is above the configured maximum for the method
    #[error("{method} payment amount {requested} exceeds the maximum allowed limit of {limit}")]
    LimitExceeded {
        method: String,
        limit: Decimal,
        requested: Decimal,
    },

    /// Method name is unknown or has no configured limit
    #[error("invalid payment method: {method}")]
    InvalidPaymentMethod { method: String },

    /// The sender/receiver method pair has no resolution route
    #[error("unsupported payment method combination: {sender} -> {receiver}")]
    UnsupportedMethodCombination { sender: String, receiver: String },

    /// Role is neither ADMIN nor USER
    #[error("invalid role: {role}")]
    InvalidRole { role: String },

    /// Malformed input (non-positive amount, missing payment fields, ...)
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },

    /// The document store could not be reached
    ///
    /// This is the only kind callers should treat as fatal. The engine never
    /// retries it.
    #[error("document store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The transfer failed and marking the transaction `fail` failed as well
    #[error("{cause}; additionally failed to mark transaction {transaction_id} as failed: {status_error}")]
    StatusUpdateFailed {
        transaction_id: String,
        /// The original transfer failure
        cause: Box<PaymentError>,
        /// The failure of the status write
        status_error: Box<PaymentError>,
    },

    /// The action's outcome failed and consuming the request failed as well
    #[error("{cause}; additionally failed to consume request {request_id}: {consume_error}")]
    RequestConsumeFailed {
        request_id: String,
        /// The failure of the action itself
        cause: Box<PaymentError>,
        /// The failure stamping `action_by` or deleting the request
        consume_error: Box<PaymentError>,
    },
}

// Helper functions for creating common errors

impl PaymentError {
    pub fn account_not_found(key: impl Into<String>) -> Self {
        PaymentError::NotFound {
            entity: "account",
            key: key.into(),
        }
    }

    pub fn transaction_not_found(key: impl Into<String>) -> Self {
        PaymentError::NotFound {
            entity: "transaction",
            key: key.into(),
        }
    }

    pub fn request_not_found(key: impl Into<String>) -> Self {
        PaymentError::NotFound {
            entity: "request",
            key: key.into(),
        }
    }

    pub fn unauthorized(user: impl Into<String>, action: impl Into<String>) -> Self {
        PaymentError::Unauthorized {
            user: user.into(),
            action: action.into(),
        }
    }

    pub fn insufficient_funds(
        account: impl Into<String>,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        PaymentError::InsufficientFunds {
            account: account.into(),
            available,
            requested,
        }
    }

    pub fn limit_exceeded(method: impl Into<String>, limit: Decimal, requested: Decimal) -> Self {
        PaymentError::LimitExceeded {
            method: method.into(),
            limit,
            requested,
        }
    }

    pub fn invalid_payment_method(method: impl Into<String>) -> Self {
        PaymentError::InvalidPaymentMethod {
            method: method.into(),
        }
    }

    pub fn unsupported_combination(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        PaymentError::UnsupportedMethodCombination {
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }

    pub fn invalid_role(role: impl Into<String>) -> Self {
        PaymentError::InvalidRole { role: role.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PaymentError::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        PaymentError::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Keep both the transfer failure and the failed status write
    pub fn status_update_failed(
        transaction_id: impl Into<String>,
        cause: PaymentError,
        status_error: PaymentError,
    ) -> Self {
        PaymentError::StatusUpdateFailed {
            transaction_id: transaction_id.into(),
            cause: Box::new(cause),
            status_error: Box::new(status_error),
        }
    }

    pub fn request_consume_failed(
        request_id: impl Into<String>,
        cause: PaymentError,
        consume_error: PaymentError,
    ) -> Self {
        PaymentError::RequestConsumeFailed {
            request_id: request_id.into(),
            cause: Box::new(cause),
            consume_error: Box::new(consume_error),
        }
    }

    /// Whether the caller should escalate instead of reporting a business failure
    pub fn is_fatal(&self) -> bool {
        match self {
            PaymentError::StoreUnavailable { .. } => true,
            PaymentError::StatusUpdateFailed { status_error, .. } => status_error.is_fatal(),
            PaymentError::RequestConsumeFailed {
                cause,
                consume_error,
                ..
            } => cause.is_fatal() || consume_error.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::account_not_found(
        PaymentError::account_not_found("ACC-7"),
        "account not found: ACC-7"
    )]
    #[case::unauthorized(
        PaymentError::unauthorized("mallory", "accept request r-1"),
        "user 'mallory' is not authorised to accept request r-1"
    )]
    #[case::insufficient_funds(
        PaymentError::insufficient_funds("ACC-1", Decimal::new(5000, 2), Decimal::new(10000, 2)),
        "Insufficient funds in account ACC-1: available 50.00, requested 100.00"
    )]
    #[case::limit_exceeded(
        PaymentError::limit_exceeded("UPI", Decimal::new(1000, 0), Decimal::new(1200, 0)),
        "UPI payment amount 1200 exceeds the maximum allowed limit of 1000"
    )]
    #[case::invalid_method(
        PaymentError::invalid_payment_method("BANK"),
        "invalid payment method: BANK"
    )]
    #[case::unsupported_combination(
        PaymentError::unsupported_combination("BANK", "UPI"),
        "unsupported payment method combination: BANK -> UPI"
    )]
    #[case::invalid_role(PaymentError::invalid_role("GUEST"), "invalid role: GUEST")]
    fn test_error_display(#[case] error: PaymentError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_status_update_failed_keeps_both_errors() {
        let err = PaymentError::status_update_failed(
            "tx-1",
            PaymentError::insufficient_funds("ACC-1", Decimal::ZERO, Decimal::ONE),
            PaymentError::store_unavailable("connection reset"),
        );

        let message = err.to_string();
        assert!(message.contains("Insufficient funds in account ACC-1"));
        assert!(message.contains("connection reset"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_request_consume_failed_names_the_request() {
        let err = PaymentError::request_consume_failed(
            "req-1",
            PaymentError::insufficient_funds("ACC-1", Decimal::ZERO, Decimal::ONE),
            PaymentError::store_unavailable("connection reset"),
        );

        let message = err.to_string();
        assert!(message.contains("failed to consume request req-1"));
        assert!(!message.contains("as failed"));
        assert!(err.is_fatal());
    }

    #[rstest]
    #[case::store(PaymentError::store_unavailable("down"), true)]
    #[case::business(PaymentError::invalid_role("x"), false)]
    #[case::validation(PaymentError::validation("amount must be positive"), false)]
    fn test_is_fatal(#[case] error: PaymentError, #[case] fatal: bool) {
        assert_eq!(error.is_fatal(), fatal);
    }
}
