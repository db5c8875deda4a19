//! I/O module
//!
//! Handles the CLI's file formats.
//!
//! # Components
//!
//! - `csv_format` - Accounts CSV (loading the initial table, writing final balances)
//! - `operations` - JSON-lines operation reader with iterator interface

pub mod csv_format;
pub mod operations;

pub use csv_format::{convert_account_row, read_accounts, write_accounts_csv, AccountRow};
pub use operations::{parse_operation, Operation, OperationReader};
