//! Transaction Query
//!
//! Role-scoped reads. `ADMIN` sees everything; `USER` sees only
//! transactions they sent or received. Listing is offset-paginated over the
//! store's creation order.

use crate::core::engine::PaymentEngine;
use crate::types::{PaymentError, Role, Transaction, TransactionId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_NUMBER: usize = 1;

/// One-based page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub number: usize,
}

impl PageRequest {
    /// Non-positive values fall back to page 1 of size 10
    pub fn new(size: i64, number: i64) -> Self {
        let normalise = |value: i64, default: usize| {
            usize::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        PageRequest {
            size: normalise(size, DEFAULT_PAGE_SIZE),
            number: normalise(number, DEFAULT_PAGE_NUMBER),
        }
    }

    /// Slice `items` to this page; a start past the end yields nothing
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = (self.number - 1).saturating_mul(self.size);
        if start >= items.len() {
            return Vec::new();
        }
        let end = start.saturating_add(self.size).min(items.len());
        items.into_iter().skip(start).take(end - start).collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            size: DEFAULT_PAGE_SIZE,
            number: DEFAULT_PAGE_NUMBER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub page_size: usize,
    pub page_number: usize,
    /// Matching transactions before slicing
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_count: Option<usize>,
}

impl PaymentEngine {
    /// Fetch one transaction if `user` may see it
    ///
    /// An unrecognised role is reported as `Unauthorized`, not `InvalidRole`.
    pub fn get_by_id(&self, id: &str, role: &str, user: &str) -> Result<Transaction, PaymentError> {
        let mut transaction = self
            .transactions
            .get(id)?
            .ok_or_else(|| PaymentError::transaction_not_found(id))?;

        let allowed = match role.parse::<Role>() {
            Ok(Role::Admin) => true,
            Ok(Role::User) => transaction.involves(user),
            Err(_) => false,
        };
        if !allowed {
            warn!(transaction_id = id, role, user, "transaction read denied");
            return Err(PaymentError::unauthorized(user, "view transaction"));
        }

        transaction.id = Some(id.to_string());
        Ok(transaction)
    }

    /// List the transactions visible to `user` under `role`, one page at a time
    ///
    /// # Errors
    ///
    /// `InvalidRole` for anything but `ADMIN` / `USER`.
    pub fn list(
        &self,
        role: &str,
        user: &str,
        page: PageRequest,
    ) -> Result<TransactionPage, PaymentError> {
        let role: Role = role.parse()?;

        let (matches, sent_count, received_count) = match role {
            Role::Admin => (self.transactions.find_all()?, None, None),
            Role::User => {
                let sent = self.transactions.find_by_sender(user)?;
                let received = self.transactions.find_by_receiver(user)?;
                let (sent_count, received_count) = (sent.len(), received.len());
                (union_by_id(sent, received), Some(sent_count), Some(received_count))
            }
        };

        let total_count = matches.len();
        let items = page
            .slice(matches)
            .into_iter()
            .map(|(id, mut transaction)| {
                transaction.id = Some(id);
                transaction
            })
            .collect::<Vec<_>>();
        debug!(?role, user, total_count, returned = items.len(), page = page.number, "transactions listed");

        Ok(TransactionPage {
            items,
            page_size: page.size,
            page_number: page.number,
            total_count,
            sent_count,
            received_count,
        })
    }
}

/// Merge two creation-ordered lists, keeping each id once
///
/// The result is ordered by timestamp; the sort is stable, so ties keep the
/// order they had in `first` followed by `second`.
fn union_by_id(
    first: Vec<(TransactionId, Transaction)>,
    second: Vec<(TransactionId, Transaction)>,
) -> Vec<(TransactionId, Transaction)> {
    let mut seen = HashSet::new();
    let mut merged: Vec<_> = first
        .into_iter()
        .chain(second)
        .filter(|(id, _)| seen.insert(id.clone()))
        .collect();
    merged.sort_by_key(|(_, transaction)| transaction.timestamp);
    merged
}
