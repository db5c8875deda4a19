//! Inbound commands accepted by the engine
//!
//! These are the decoded bodies of "send money" and "request money" calls.
//! `validate` rejects malformed input before any store is touched.

use super::error::PaymentError;
use super::payment::{PaymentDetails, PaymentMethod};
use super::transaction::{TransactionType, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sender-initiated transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCommand {
    pub sender_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub receiving_method: PaymentMethod,
    #[serde(default)]
    pub transaction_type: TransactionType,
    pub sender_payment_details: PaymentDetails,
    pub receiver_payment_details: PaymentDetails,
}

impl TransferCommand {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.sender_id.trim().is_empty() {
            return Err(PaymentError::validation("sender id is required"));
        }
        if self.transaction_type != TransactionType::Payment {
            return Err(PaymentError::validation(
                "transaction type must be Payment for a transfer",
            ));
        }
        ensure_positive(self.amount)?;
        self.sender_payment_details.validate()?;
        self.receiver_payment_details.validate()?;
        self.sender_payment_details
            .identifier_for(self.payment_method)?;
        self.receiver_payment_details
            .identifier_for(self.receiving_method)?;
        Ok(())
    }
}

/// Request for `payer_id` to pay `requester_id`
///
/// Only UPI is accepted on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestCommand {
    pub requester_id: UserId,
    pub payer_id: UserId,
    pub amount: Decimal,
    pub requester_payment_method: PaymentMethod,
    pub payer_payment_method: PaymentMethod,
    pub requester_payment_details: PaymentDetails,
    pub payer_payment_details: PaymentDetails,
}

impl PaymentRequestCommand {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.requester_id.trim().is_empty() || self.payer_id.trim().is_empty() {
            return Err(PaymentError::validation(
                "requester id and payer id are required",
            ));
        }
        ensure_positive(self.amount)?;
        if self.requester_payment_method != PaymentMethod::Upi
            || self.payer_payment_method != PaymentMethod::Upi
        {
            return Err(PaymentError::validation(
                "only UPI is supported for payment requests",
            ));
        }
        self.requester_payment_details
            .identifier_for(PaymentMethod::Upi)
            .and_then(|_| self.requester_payment_details.validate())
            .map_err(|e| PaymentError::validation(format!("invalid requester details: {e}")))?;
        self.payer_payment_details
            .identifier_for(PaymentMethod::Upi)
            .and_then(|_| self.payer_payment_details.validate())
            .map_err(|e| PaymentError::validation(format!("invalid payer details: {e}")))?;
        Ok(())
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::validation(format!(
            "amount must be greater than 0, got {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn transfer() -> TransferCommand {
        TransferCommand {
            sender_id: "alice".to_string(),
            receiver_id: Some("bob".to_string()),
            amount: Decimal::new(200, 0),
            payment_method: PaymentMethod::Upi,
            receiving_method: PaymentMethod::Bank,
            transaction_type: TransactionType::Payment,
            sender_payment_details: PaymentDetails::upi("alice@upi"),
            receiver_payment_details: PaymentDetails::bank("ACC-2", "SBIN0001", "SBI"),
        }
    }

    fn request() -> PaymentRequestCommand {
        PaymentRequestCommand {
            requester_id: "bob".to_string(),
            payer_id: "alice".to_string(),
            amount: Decimal::new(50, 0),
            requester_payment_method: PaymentMethod::Upi,
            payer_payment_method: PaymentMethod::Upi,
            requester_payment_details: PaymentDetails::upi("bob@upi"),
            payer_payment_details: PaymentDetails::upi("alice@upi"),
        }
    }

    #[test]
    fn test_valid_transfer() {
        assert!(transfer().validate().is_ok());
    }

    #[rstest]
    #[case::zero_amount(TransferCommand { amount: Decimal::ZERO, ..transfer() })]
    #[case::negative_amount(TransferCommand { amount: Decimal::new(-5, 0), ..transfer() })]
    #[case::blank_sender(TransferCommand { sender_id: " ".to_string(), ..transfer() })]
    #[case::wrong_type(TransferCommand { transaction_type: TransactionType::Request, ..transfer() })]
    #[case::details_do_not_match_method(TransferCommand { receiving_method: PaymentMethod::Upi, ..transfer() })]
    #[case::incomplete_bank_details(TransferCommand {
        receiver_payment_details: PaymentDetails::bank("ACC-2", "", "SBI"),
        ..transfer()
    })]
    fn test_invalid_transfer(#[case] command: TransferCommand) {
        assert!(matches!(
            command.validate(),
            Err(PaymentError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[rstest]
    #[case::zero_amount(PaymentRequestCommand { amount: Decimal::ZERO, ..request() })]
    #[case::missing_payer(PaymentRequestCommand { payer_id: String::new(), ..request() })]
    #[case::card_payer(PaymentRequestCommand {
        payer_payment_method: PaymentMethod::CreditCard,
        payer_payment_details: PaymentDetails::credit_card("card-1", "4242"),
        ..request()
    })]
    #[case::blank_upi(PaymentRequestCommand {
        requester_payment_details: PaymentDetails::upi(""),
        ..request()
    })]
    fn test_invalid_request(#[case] command: PaymentRequestCommand) {
        assert!(matches!(
            command.validate(),
            Err(PaymentError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_transfer_deserializes_with_default_type() {
        let command: TransferCommand = serde_json::from_str(
            r#"{
                "sender_id": "alice",
                "amount": 200,
                "payment_method": "upi",
                "receiving_method": "upi",
                "sender_payment_details": {"type": "upi", "upi_id": "alice@upi"},
                "receiver_payment_details": {"type": "upi", "upi_id": "bob@upi"}
            }"#,
        )
        .unwrap();

        assert_eq!(command.transaction_type, TransactionType::Payment);
        assert_eq!(command.amount, Decimal::new(200, 0));
        assert!(command.receiver_id.is_none());
    }
}
