//! Payment-method types
//!
//! A party names its instrument with a `PaymentMethod` and the matching
//! `PaymentDetails`. Details are never mutated once a transaction is built.

use super::account::IdentifierField;
use super::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment instrument kind
///
/// Parsed case-insensitively from `upi`, `credit_card` (or `credit`) and
/// `bank`; always rendered in upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentMethod {
    Upi,
    CreditCard,
    Bank,
}

impl PaymentMethod {
    /// Directory field an identifier of this method is matched against
    pub fn identifier_field(self) -> IdentifierField {
        match self {
            PaymentMethod::Upi => IdentifierField::UpiId,
            PaymentMethod::CreditCard => IdentifierField::CardId,
            PaymentMethod::Bank => IdentifierField::AccountNumber,
        }
    }

    /// Normalised name the limit configuration is keyed by
    pub fn limit_key(self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::CreditCard => "CREDIT",
            PaymentMethod::Bank => "BANK",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::Bank => "BANK",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPI" => Ok(PaymentMethod::Upi),
            "CREDIT_CARD" | "CREDIT" => Ok(PaymentMethod::CreditCard),
            "BANK" => Ok(PaymentMethod::Bank),
            _ => Err(PaymentError::invalid_payment_method(s)),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

/// One party's payment instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentDetails {
    Upi {
        upi_id: String,
    },
    CreditCard {
        card_id: String,
        last_four: String,
    },
    Bank {
        account_number: String,
        ifsc_code: String,
        bank_name: String,
    },
}

impl PaymentDetails {
    pub fn upi(upi_id: impl Into<String>) -> Self {
        PaymentDetails::Upi {
            upi_id: upi_id.into(),
        }
    }

    pub fn credit_card(card_id: impl Into<String>, last_four: impl Into<String>) -> Self {
        PaymentDetails::CreditCard {
            card_id: card_id.into(),
            last_four: last_four.into(),
        }
    }

    pub fn bank(
        account_number: impl Into<String>,
        ifsc_code: impl Into<String>,
        bank_name: impl Into<String>,
    ) -> Self {
        PaymentDetails::Bank {
            account_number: account_number.into(),
            ifsc_code: ifsc_code.into(),
            bank_name: bank_name.into(),
        }
    }

    /// The method these details belong to
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::Upi { .. } => PaymentMethod::Upi,
            PaymentDetails::CreditCard { .. } => PaymentMethod::CreditCard,
            PaymentDetails::Bank { .. } => PaymentMethod::Bank,
        }
    }

    /// The value the Account Directory resolves these details by
    pub fn identifier(&self) -> &str {
        match self {
            PaymentDetails::Upi { upi_id } => upi_id,
            PaymentDetails::CreditCard { card_id, .. } => card_id,
            PaymentDetails::Bank { account_number, .. } => account_number,
        }
    }

    /// Identifier for `method`, failing if the details describe another method
    pub fn identifier_for(&self, method: PaymentMethod) -> Result<&str, PaymentError> {
        if self.method() != method {
            return Err(PaymentError::validation(format!(
                "{} details supplied for a {} payment",
                self.method(),
                method
            )));
        }
        Ok(self.identifier())
    }

    /// Check that every field the method requires is present
    pub fn validate(&self) -> Result<(), PaymentError> {
        let complete = match self {
            PaymentDetails::Upi { upi_id } => !upi_id.trim().is_empty(),
            PaymentDetails::CreditCard { card_id, last_four } => {
                !card_id.trim().is_empty() && !last_four.trim().is_empty()
            }
            PaymentDetails::Bank {
                account_number,
                ifsc_code,
                bank_name,
            } => {
                !account_number.trim().is_empty()
                    && !ifsc_code.trim().is_empty()
                    && !bank_name.trim().is_empty()
            }
        };
        if complete {
            Ok(())
        } else {
            let required = match self {
                PaymentDetails::Upi { .. } => "UPI id is required for UPI payments",
                PaymentDetails::CreditCard { .. } => {
                    "card id and last four digits are required for credit card payments"
                }
                PaymentDetails::Bank { .. } => {
                    "account number, IFSC code and bank name are required for bank payments"
                }
            };
            Err(PaymentError::validation(required))
        }
    }
}
