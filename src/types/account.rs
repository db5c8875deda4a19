//! Account-related types for the payflow engine
//!
//! This module defines the Account record held by the Account Directory store
//! and the identifier fields it can be looked up by.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical account number
pub type AccountNumber = String;

/// Account record in the directory store
///
/// An account is reachable through any of its payment-method identifiers
/// (UPI handle, card id or the account number itself). Only the ledger
/// mutates `balance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The canonical account number
    pub account_number: AccountNumber,

    /// UPI handle linked to this account, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,

    /// Card id linked to this account, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,

    /// Current balance
    pub balance: Decimal,

    /// Stamped by the ledger on every debit or credit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create an account with no linked UPI handle or card
    pub fn new(account_number: impl Into<AccountNumber>, balance: Decimal) -> Self {
        Account {
            account_number: account_number.into(),
            upi_id: None,
            card_id: None,
            balance,
            updated_at: None,
        }
    }

    /// Link a UPI handle to this account
    pub fn with_upi(mut self, upi_id: impl Into<String>) -> Self {
        self.upi_id = Some(upi_id.into());
        self
    }

    /// Link a card id to this account
    pub fn with_card(mut self, card_id: impl Into<String>) -> Self {
        self.card_id = Some(card_id.into());
        self
    }

    /// Value of the given identifier field on this record
    pub fn identifier(&self, field: IdentifierField) -> Option<&str> {
        match field {
            IdentifierField::UpiId => self.upi_id.as_deref(),
            IdentifierField::CardId => self.card_id.as_deref(),
            IdentifierField::AccountNumber => Some(self.account_number.as_str()),
        }
    }
}

/// Stored identifier fields an account can be resolved by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierField {
    UpiId,
    CardId,
    AccountNumber,
}

impl fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentifierField::UpiId => "upi_id",
            IdentifierField::CardId => "card_id",
            IdentifierField::AccountNumber => "account_number",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::upi(IdentifierField::UpiId, Some("alice@bank"))]
    #[case::card(IdentifierField::CardId, None)]
    #[case::account_number(IdentifierField::AccountNumber, Some("ACC-1"))]
    fn test_identifier_lookup(#[case] field: IdentifierField, #[case] expected: Option<&str>) {
        let account = Account::new("ACC-1", Decimal::ZERO).with_upi("alice@bank");
        assert_eq!(account.identifier(field), expected);
    }

    #[test]
    fn test_identifier_field_display_matches_store_field_names() {
        assert_eq!(IdentifierField::UpiId.to_string(), "upi_id");
        assert_eq!(IdentifierField::CardId.to_string(), "card_id");
        assert_eq!(IdentifierField::AccountNumber.to_string(), "account_number");
    }
}
