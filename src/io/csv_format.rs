//! CSV format handling for account snapshots
//!
//! This module centralizes the accounts CSV format, providing:
//! - AccountRow structure for deserialization
//! - Conversion from rows to `Account`
//! - Reading a whole accounts file
//! - Account output serialization
//!
//! Columns: `account_number, upi_id, card_id, balance`. `upi_id` and
//! `card_id` may be left empty.

use crate::types::{Account, AccountNumber};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// CSV row structure for deserialization
///
/// The balance is kept as text so a bad value can be reported with its
/// account number.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountRow {
    pub account_number: AccountNumber,
    pub upi_id: Option<String>,
    pub card_id: Option<String>,
    pub balance: String,
}

/// Convert an AccountRow to an Account
///
/// # Returns
///
/// Result containing either:
/// - Ok(Account) - Successfully converted row
/// - Err(String) - Error message describing the conversion failure
pub fn convert_account_row(row: AccountRow) -> Result<Account, String> {
    if row.account_number.trim().is_empty() {
        return Err("Account number is required".to_string());
    }

    let balance = Decimal::from_str(row.balance.trim()).map_err(|_| {
        format!(
            "Invalid balance '{}' for account {}",
            row.balance, row.account_number
        )
    })?;
    if balance.is_sign_negative() {
        return Err(format!(
            "Negative balance {} for account {}",
            balance, row.account_number
        ));
    }

    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    Ok(Account {
        account_number: row.account_number,
        upi_id: non_blank(row.upi_id),
        card_id: non_blank(row.card_id),
        balance,
        updated_at: None,
    })
}

/// Read every account from a CSV file
///
/// Unlike the operations reader this is all-or-nothing: the engine should
/// not start against a partially loaded account table.
///
/// # Errors
///
/// The first unreadable or invalid row (with its line number), or a
/// duplicated account number.
pub fn read_accounts(path: &Path) -> Result<Vec<Account>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .buffer_capacity(8 * 1024)
        .from_reader(file);

    let mut seen = HashSet::new();
    let mut accounts = Vec::new();
    for (index, row) in reader.deserialize::<AccountRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let account = row
            .map_err(|e| format!("Line {}: CSV parse error: {}", line, e))
            .and_then(|row| convert_account_row(row).map_err(|e| format!("Line {}: {}", line, e)))?;
        if !seen.insert(account.account_number.clone()) {
            return Err(format!(
                "Line {}: duplicate account {}",
                line, account.account_number
            ));
        }
        accounts.push(account);
    }
    Ok(accounts)
}

/// Write account states to CSV format
///
/// Same columns as the input. Accounts are sorted by account number for
/// deterministic output.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account_number", "upi_id", "card_id", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));

    for account in sorted_accounts {
        writer
            .write_record([
                account.account_number.as_str(),
                account.upi_id.as_deref().unwrap_or_default(),
                account.card_id.as_deref().unwrap_or_default(),
                account.balance.to_string().as_str(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
