//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account records and directory identifier fields
//! - `payment`: Payment methods and payment details
//! - `transaction`: Transaction and request records, statuses, actions, roles
//! - `command`: Inbound transfer and payment-request commands
//! - `error`: Error types for the engine

pub mod account;
pub mod command;
pub mod error;
pub mod payment;
pub mod transaction;

pub use account::{Account, AccountNumber, IdentifierField};
pub use command::{PaymentRequestCommand, TransferCommand};
pub use error::PaymentError;
pub use payment::{PaymentDetails, PaymentMethod};
pub use transaction::{
    RequestAction, RequestId, Role, Transaction, TransactionId, TransactionRequest,
    TransactionStatus, TransactionType, TransactionUpdate, UserId,
};
