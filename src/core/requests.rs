//! Payment Request Lifecycle
//!
//! A requester asks a payer for money. `make_request` records a `pending`
//! transaction of type `request` (sender = payer, receiver = requester) and a
//! single-use [`TransactionRequest`] pointing at it. `act` consumes that
//! token exactly once:
//!
//! ```text
//! pending --accept (payer, transfer ok)--> success
//! pending --accept (transfer fails)------> fail
//! pending --cancel (either party)--------> cancel
//! pending --any other action-------------> fail
//! ```
//!
//! Unauthorized attempts return before anything is written.

use crate::core::engine::PaymentEngine;
use crate::types::{
    PaymentError, PaymentRequestCommand, RequestAction, RequestId, Transaction,
    TransactionRequest, TransactionStatus, TransactionType, TransactionUpdate,
};
use chrono::Utc;
use tracing::{debug, error, info, warn};

impl PaymentEngine {
    /// Record a pending request-backed transaction and its request token
    ///
    /// # Returns
    ///
    /// The id of the new [`TransactionRequest`]; the linked transaction id is
    /// stored on it.
    pub fn make_request(&self, command: PaymentRequestCommand) -> Result<RequestId, PaymentError> {
        command.validate().inspect_err(|e| {
            warn!(requester = %command.requester_id, error = %e, "payment request rejected");
        })?;

        let transaction = Transaction {
            id: None,
            sender_id: command.payer_id.clone(),
            receiver_id: Some(command.requester_id.clone()),
            amount: command.amount,
            sender_payment_method: command.payer_payment_method,
            receiver_payment_method: command.requester_payment_method,
            sender_payment_details: command.payer_payment_details,
            receiver_payment_details: command.requester_payment_details,
            status: TransactionStatus::Pending,
            timestamp: Utc::now(),
            transaction_type: TransactionType::Request,
            action_by: Some(command.requester_id.clone()),
        };

        let (transaction_id, accounts) = self.record_pending(transaction, None)?;

        let request = TransactionRequest {
            id: None,
            requester_account_no: accounts.receiver,
            payer_account_no: accounts.sender,
            amount: command.amount,
            payment_method: command.requester_payment_method,
            transaction_id: transaction_id.clone(),
            from: command.requester_id.clone(),
            to: command.payer_id.clone(),
        };
        let request_id = self.requests.insert(request)?;
        self.requests.set_id(&request_id)?;

        info!(
            request_id = %request_id,
            transaction_id = %transaction_id,
            requester = %command.requester_id,
            payer = %command.payer_id,
            amount = %command.amount,
            "payment request created"
        );
        Ok(request_id)
    }

    /// Apply `action` to a pending request on behalf of `acting_user`
    ///
    /// Calls for the same `request_id` are serialized within this process;
    /// the second caller finds the request already consumed (`NotFound`).
    ///
    /// # Returns
    ///
    /// The status the linked transaction was moved to.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request or its transaction is missing
    /// - `Unauthorized` if `acting_user` may not apply `action`; nothing is
    ///   written in that case
    /// - any ledger error for `Accept`, after the transaction is marked `fail`
    ///   and the request consumed
    /// - a store error if the `success` status write fails after the transfer
    ///   committed; the request is consumed anyway so it cannot settle twice
    /// - `RequestConsumeFailed` if the action failed and consuming the request
    ///   failed too
    pub fn act(
        &self,
        request_id: &str,
        action: &RequestAction,
        acting_user: &str,
    ) -> Result<TransactionStatus, PaymentError> {
        let _guard = self.locks.acquire(request_id);

        let request = self
            .requests
            .get(request_id)?
            .ok_or_else(|| PaymentError::request_not_found(request_id))?;
        let transaction = self
            .transactions
            .get(&request.transaction_id)?
            .ok_or_else(|| PaymentError::transaction_not_found(&request.transaction_id))?;
        let transaction_id = request.transaction_id.as_str();

        let outcome = match action {
            RequestAction::Accept => {
                let authorized = transaction.is_sender(&request.to)
                    && request.to.eq_ignore_ascii_case(acting_user);
                if !authorized {
                    warn!(request_id, user = acting_user, "unauthorized accept");
                    return Err(PaymentError::unauthorized(acting_user, "accept"));
                }
                match self.ledger.transfer(
                    &request.payer_account_no,
                    &request.requester_account_no,
                    request.amount,
                    request.payment_method,
                ) {
                    Ok(_) => self
                        .set_status(transaction_id, TransactionStatus::Success)
                        .map(|()| TransactionStatus::Success)
                        .inspect_err(|e| {
                            // The request is still consumed below so it cannot settle twice.
                            error!(
                                request_id,
                                transaction_id,
                                amount = %request.amount,
                                error = %e,
                                "transfer committed but transaction left pending"
                            );
                        }),
                    Err(cause) => {
                        warn!(request_id, transaction_id, error = %cause, "accepted request failed to settle");
                        Err(self.fail_transaction(transaction_id, cause))
                    }
                }
            }
            RequestAction::Cancel => {
                let as_requester = request.from.eq_ignore_ascii_case(acting_user)
                    && transaction.is_receiver(acting_user);
                let as_payer = request.to.eq_ignore_ascii_case(acting_user)
                    && transaction.is_sender(acting_user);
                if !(as_requester || as_payer) {
                    warn!(request_id, user = acting_user, "unauthorized cancel");
                    return Err(PaymentError::unauthorized(acting_user, "cancel"));
                }
                self.set_status(transaction_id, TransactionStatus::Cancel)
                    .map(|()| TransactionStatus::Cancel)
            }
            RequestAction::Other(raw) => {
                // Unrecognised actions reject the request without an authorization check.
                warn!(request_id, action = %raw, user = acting_user, "unknown request action, failing transaction");
                self.set_status(transaction_id, TransactionStatus::Fail)
                    .map(|()| TransactionStatus::Fail)
            }
        };

        let consumed = self.consume(request_id, transaction_id, acting_user);
        match (outcome, consumed) {
            (Ok(status), Ok(())) => {
                info!(request_id, transaction_id, %status, user = acting_user, "request action applied");
                Ok(status)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(cause), Err(consume_error)) => Err(PaymentError::request_consume_failed(
                request_id,
                cause,
                consume_error,
            )),
        }
    }

    /// Stamp the actor on the transaction and delete the request token
    fn consume(
        &self,
        request_id: &str,
        transaction_id: &str,
        acting_user: &str,
    ) -> Result<(), PaymentError> {
        self.transactions.update(
            transaction_id,
            TransactionUpdate::ActionBy(acting_user.to_string()),
        )?;
        self.requests.delete(request_id)?;
        debug!(request_id, "request consumed");
        Ok(())
    }
}
