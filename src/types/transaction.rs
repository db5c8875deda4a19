//! Transaction-related types for the payflow engine
//!
//! This module defines the persisted Transaction and TransactionRequest
//! records, their status machine, the field-level updates the lifecycles
//! apply to them, and the action/role vocabulary callers use.

use super::error::PaymentError;
use super::payment::{PaymentDetails, PaymentMethod};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Store-assigned transaction identifier
pub type TransactionId = String;

/// Store-assigned request identifier
pub type RequestId = String;

/// Identity of a user (sender, receiver, actor)
pub type UserId = String;

/// Lifecycle status of a Transaction
///
/// `pending` is the only non-terminal status. A transaction never re-enters
/// `pending` once it has left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Fail,
    Cancel,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Fail => "fail",
            TransactionStatus::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// How a transaction came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionType {
    /// Sender-initiated transfer
    #[default]
    #[serde(alias = "payment", alias = "PAYMENT")]
    Payment,
    /// Created by a payment request; settles only when the payer accepts
    #[serde(alias = "request", alias = "REQUEST")]
    Request,
}

/// Persisted record of one money movement attempt and its outcome
///
/// `id` is assigned by the store after insertion and then written back, so a
/// freshly inserted record is briefly observable with `id == None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<TransactionId>,
    pub sender_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    pub amount: Decimal,
    pub sender_payment_method: PaymentMethod,
    pub receiver_payment_method: PaymentMethod,
    pub sender_payment_details: PaymentDetails,
    pub receiver_payment_details: PaymentDetails,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    pub transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_by: Option<UserId>,
}

impl Transaction {
    /// Whether `user` is the sender or the receiver (ASCII case-insensitive)
    pub fn involves(&self, user: &str) -> bool {
        self.is_sender(user) || self.is_receiver(user)
    }

    pub fn is_sender(&self, user: &str) -> bool {
        self.sender_id.eq_ignore_ascii_case(user)
    }

    pub fn is_receiver(&self, user: &str) -> bool {
        self.receiver_id
            .as_deref()
            .is_some_and(|receiver| receiver.eq_ignore_ascii_case(user))
    }
}

/// Field-level update applied by the store to a single transaction
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionUpdate {
    Id(TransactionId),
    ReceiverId(UserId),
    Status(TransactionStatus),
    ActionBy(UserId),
}

impl TransactionUpdate {
    pub fn apply(&self, transaction: &mut Transaction) {
        match self {
            TransactionUpdate::Id(id) => transaction.id = Some(id.clone()),
            TransactionUpdate::ReceiverId(receiver) => {
                transaction.receiver_id = Some(receiver.clone())
            }
            TransactionUpdate::Status(status) => transaction.status = *status,
            TransactionUpdate::ActionBy(user) => transaction.action_by = Some(user.clone()),
        }
    }
}

/// Single-use workflow token linking a pending request-backed Transaction to
/// the two parties who must act on it
///
/// Deleted once any action has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub id: Option<RequestId>,
    pub requester_account_no: String,
    pub payer_account_no: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub transaction_id: TransactionId,
    /// The requester
    pub from: UserId,
    /// The payer
    pub to: UserId,
}

/// Action a party applies to a payment request
///
/// Anything other than `accept` / `cancel` (case-insensitive) is kept
/// verbatim as `Other` and fails the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestAction {
    Accept,
    Cancel,
    Other(String),
}

impl FromStr for RequestAction {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("accept") {
            RequestAction::Accept
        } else if s.eq_ignore_ascii_case("cancel") {
            RequestAction::Cancel
        } else {
            RequestAction::Other(s.to_string())
        })
    }
}

impl From<String> for RequestAction {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}

impl From<RequestAction> for String {
    fn from(action: RequestAction) -> Self {
        action.to_string()
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestAction::Accept => f.write_str("Accept"),
            RequestAction::Cancel => f.write_str("Cancel"),
            RequestAction::Other(raw) => f.write_str(raw),
        }
    }
}

/// Caller role for transaction queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sees every transaction
    Admin,
    /// Sees only transactions they sent or received
    User,
}

impl FromStr for Role {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else if s.eq_ignore_ascii_case("user") {
            Ok(Role::User)
        } else {
            Err(PaymentError::invalid_role(s.to_ascii_uppercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Transaction {
        Transaction {
            id: None,
            sender_id: "alice".to_string(),
            receiver_id: None,
            amount: Decimal::new(200, 0),
            sender_payment_method: PaymentMethod::Upi,
            receiver_payment_method: PaymentMethod::Upi,
            sender_payment_details: PaymentDetails::upi("alice@upi"),
            receiver_payment_details: PaymentDetails::upi("bob@upi"),
            status: TransactionStatus::Pending,
            timestamp: Utc::now(),
            transaction_type: TransactionType::Payment,
            action_by: Some("alice".to_string()),
        }
    }

    #[rstest]
    #[case::accept("accept", RequestAction::Accept)]
    #[case::accept_mixed_case("ACCEPT", RequestAction::Accept)]
    #[case::cancel("Cancel", RequestAction::Cancel)]
    #[case::other("reject", RequestAction::Other("reject".to_string()))]
    fn test_action_parsing(#[case] raw: &str, #[case] expected: RequestAction) {
        assert_eq!(RequestAction::from(raw.to_string()), expected);
    }

    #[rstest]
    #[case::admin("ADMIN", Role::Admin)]
    #[case::user_lower("user", Role::User)]
    fn test_role_parsing(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_role_is_invalid() {
        assert_eq!(
            "guest".parse::<Role>().unwrap_err(),
            PaymentError::invalid_role("GUEST")
        );
    }

    #[test]
    fn test_updates_apply_single_fields() {
        let mut tx = sample();

        TransactionUpdate::Id("tx-1".to_string()).apply(&mut tx);
        TransactionUpdate::ReceiverId("bob".to_string()).apply(&mut tx);
        TransactionUpdate::Status(TransactionStatus::Success).apply(&mut tx);
        TransactionUpdate::ActionBy("bob".to_string()).apply(&mut tx);

        assert_eq!(tx.id.as_deref(), Some("tx-1"));
        assert_eq!(tx.receiver_id.as_deref(), Some("bob"));
        assert_eq!(tx.status, TransactionStatus::Success);
        assert_eq!(tx.action_by.as_deref(), Some("bob"));
        assert_eq!(tx.amount, Decimal::new(200, 0));
    }

    #[test]
    fn test_involves_is_case_insensitive() {
        let mut tx = sample();
        tx.receiver_id = Some("Bob".to_string());

        assert!(tx.involves("ALICE"));
        assert!(tx.involves("bob"));
        assert!(!tx.involves("carol"));
    }

    #[test]
    fn test_status_terminality() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Fail.is_terminal());
        assert!(TransactionStatus::Cancel.is_terminal());
    }
}
