//! In-memory `transaction` collection with a change feed
//!
//! Every insert and field update is appended to a [`ChangeLog`] and published
//! as a [`TransactionChange`] on a `tokio::sync::broadcast` channel. The
//! channel wakes the relay; the log is what it re-reads when it falls behind
//! the channel's buffer. A single feed mutex covers "mutate, append, publish"
//! so change sequence numbers follow the order in which writes were applied.

use super::collection::Collection;
use crate::core::traits::TransactionStore;
use crate::relay::{ChangeKind, ChangeSource, TransactionChange};
use crate::types::{PaymentError, Transaction, TransactionId, TransactionUpdate};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of unread changes a slow subscriber may fall behind by
/// before it has to catch up from the [`ChangeLog`]
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Every change the store has published, in sequence order
///
/// Sequences start at 1 and have no gaps, so the change with sequence `n`
/// sits at index `n - 1`. Handles are cheap to clone and do not keep the
/// broadcast channel open.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    entries: Arc<RwLock<Vec<TransactionChange>>>,
}

impl ChangeLog {
    fn append(&self, change: TransactionChange) {
        self.entries.write().push(change);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ChangeSource for ChangeLog {
    fn changes_since(&self, watermark: u64) -> Vec<TransactionChange> {
        let entries = self.entries.read();
        let start = usize::try_from(watermark).unwrap_or(usize::MAX).min(entries.len());
        entries[start..].to_vec()
    }
}

#[derive(Debug)]
struct ChangeFeed {
    next_sequence: u64,
    log: ChangeLog,
    sender: broadcast::Sender<TransactionChange>,
}

impl ChangeFeed {
    fn publish(&mut self, transaction_id: &str, kind: ChangeKind, transaction: Transaction) {
        self.next_sequence += 1;
        let change = TransactionChange {
            sequence: self.next_sequence,
            transaction_id: transaction_id.to_string(),
            kind,
            transaction,
        };
        self.log.append(change.clone());
        // No subscribers is not an error: the feed is optional.
        let _ = self.sender.send(change);
    }
}

/// Thread-safe in-memory transaction store
#[derive(Debug)]
pub struct MemoryTransactionStore {
    documents: Collection<Transaction>,
    feed: Mutex<ChangeFeed>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    pub fn with_feed_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            documents: Collection::new(),
            feed: Mutex::new(ChangeFeed {
                next_sequence: 0,
                log: ChangeLog::default(),
                sender,
            }),
        }
    }

    /// Subscribe to changes made after this call
    pub fn subscribe(&self) -> broadcast::Receiver<TransactionChange> {
        self.feed.lock().sender.subscribe()
    }

    /// Handle on the full change history, for catching up after a lag
    pub fn change_log(&self) -> ChangeLog {
        self.feed.lock().log.clone()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for MemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn insert(&self, transaction: Transaction) -> Result<TransactionId, PaymentError> {
        let mut feed = self.feed.lock();
        let id = self.documents.insert(transaction.clone());
        feed.publish(&id, ChangeKind::Created, transaction);
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<Transaction>, PaymentError> {
        Ok(self.documents.get(id))
    }

    fn update(&self, id: &str, update: TransactionUpdate) -> Result<(), PaymentError> {
        let mut feed = self.feed.lock();
        let updated = self
            .documents
            .update(id, |transaction| update.apply(transaction))
            .ok_or_else(|| PaymentError::transaction_not_found(id))?;
        feed.publish(id, ChangeKind::Updated, updated);
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<(TransactionId, Transaction)>, PaymentError> {
        Ok(self.documents.filter(|_| true))
    }

    fn find_by_sender(
        &self,
        user: &str,
    ) -> Result<Vec<(TransactionId, Transaction)>, PaymentError> {
        Ok(self.documents.filter(|tx| tx.sender_id == user))
    }

    fn find_by_receiver(
        &self,
        user: &str,
    ) -> Result<Vec<(TransactionId, Transaction)>, PaymentError> {
        Ok(self
            .documents
            .filter(|tx| tx.receiver_id.as_deref() == Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        PaymentDetails, PaymentMethod, TransactionStatus, TransactionType,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn pending(sender: &str, receiver: Option<&str>) -> Transaction {
        Transaction {
            id: None,
            sender_id: sender.to_string(),
            receiver_id: receiver.map(str::to_string),
            amount: Decimal::new(10, 0),
            sender_payment_method: PaymentMethod::Upi,
            receiver_payment_method: PaymentMethod::Upi,
            sender_payment_details: PaymentDetails::upi(format!("{sender}@upi")),
            receiver_payment_details: PaymentDetails::upi("other@upi"),
            status: TransactionStatus::Pending,
            timestamp: Utc::now(),
            transaction_type: TransactionType::Payment,
            action_by: Some(sender.to_string()),
        }
    }

    #[test]
    fn test_insert_does_not_write_id_into_record() {
        let store = MemoryTransactionStore::new();

        let id = store.insert(pending("alice", None)).unwrap();

        assert_eq!(store.get(&id).unwrap().unwrap().id, None);
        store
            .update(&id, TransactionUpdate::Id(id.clone()))
            .unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().id, Some(id));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = MemoryTransactionStore::new();
        let result = store.update("nope", TransactionUpdate::Status(TransactionStatus::Fail));
        assert_eq!(result, Err(PaymentError::transaction_not_found("nope")));
    }

    #[test]
    fn test_find_by_sender_and_receiver() {
        let store = MemoryTransactionStore::new();
        let sent = store.insert(pending("alice", Some("bob"))).unwrap();
        let received = store.insert(pending("bob", Some("alice"))).unwrap();
        store.insert(pending("carol", Some("bob"))).unwrap();

        let by_sender: Vec<_> = store
            .find_by_sender("alice")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let by_receiver: Vec<_> = store
            .find_by_receiver("alice")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        assert_eq!(by_sender, vec![sent]);
        assert_eq!(by_receiver, vec![received]);
        assert_eq!(store.find_all().unwrap().len(), 3);
    }

    #[test]
    fn test_changes_are_published_in_order() {
        let store = MemoryTransactionStore::new();
        let mut changes = store.subscribe();

        let id = store.insert(pending("alice", None)).unwrap();
        store
            .update(&id, TransactionUpdate::Status(TransactionStatus::Success))
            .unwrap();

        let created = changes.try_recv().unwrap();
        let updated = changes.try_recv().unwrap();

        assert_eq!(created.kind, ChangeKind::Created);
        assert_eq!(created.sequence, 1);
        assert_eq!(updated.kind, ChangeKind::Updated);
        assert_eq!(updated.sequence, 2);
        assert_eq!(updated.transaction.status, TransactionStatus::Success);
        assert_eq!(updated.transaction_id, id);
    }

    #[test]
    fn test_change_log_keeps_what_the_channel_overwrote() {
        let store = MemoryTransactionStore::with_feed_capacity(2);
        let _changes = store.subscribe();
        let log = store.change_log();

        for _ in 0..5 {
            store.insert(pending("alice", None)).unwrap();
        }

        assert_eq!(log.len(), 5);
        let sequences: Vec<_> = log.changes_since(0).iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        let tail: Vec<_> = log.changes_since(3).iter().map(|c| c.sequence).collect();
        assert_eq!(tail, vec![4, 5]);
        assert!(log.changes_since(5).is_empty());
        assert!(log.changes_since(99).is_empty());
    }
}
