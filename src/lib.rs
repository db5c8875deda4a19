//! payflow: payment transaction engine
//! # Overview
//!
//! This library moves money between accounts addressed by payment-method
//! identifiers (UPI handle, card id, bank account number), records every
//! attempt as a transaction, and supports request-to-pay flows that the
//! payer accepts or either party cancels.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, commands, errors)
//! - [`core`] - Business logic components:
//!   - [`core::directory`] - Account Directory (identifier to account number)
//!   - [`core::limits`] - Per-method maximum amounts
//!   - [`core::ledger`] - Atomic debit/credit between two accounts
//!   - [`core::lock_registry`] - Per-request mutual exclusion
//!   - [`core::engine`] - `PaymentEngine` and its five operations
//! - [`store`] - In-memory document store (accounts, transactions, requests)
//! - [`relay`] - Change-feed relay for downstream publication
//! - [`config`], [`logging`] - Ambient configuration and tracing setup
//! - [`io`], [`cli`], [`runner`] - The replay CLI's file formats and driver
//!
//! # Operations
//!
//! - **initiate**: Record a transfer as pending, settle it, finish as success or fail
//! - **make_request**: Record a pending request-to-pay and its single-use token
//! - **act**: Accept, cancel or reject a request (serialized per request id)
//! - **get_by_id**: Read one transaction, role-scoped
//! - **list**: Page through transactions, role-scoped
//!
//! # Transaction States
//!
//! Each transaction is created `pending` and ends in exactly one of:
//! - `success`: the ledger transfer committed
//! - `fail`: the transfer was rejected, or the request was rejected
//! - `cancel`: a party cancelled the request

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod relay;
pub mod runner;
pub mod store;
pub mod types;

pub use config::{EngineConfig, PaymentLimits};
pub use core::{PageRequest, PaymentEngine, TransactionPage};
pub use io::write_accounts_csv;
pub use types::{
    Account, PaymentDetails, PaymentError, PaymentMethod, PaymentRequestCommand, RequestAction,
    Transaction, TransactionId, TransactionStatus, TransferCommand,
};
