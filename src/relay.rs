//! Change-feed relay
//!
//! The transaction store emits a [`TransactionChange`] for every insert and
//! field update. A [`Relay`] drains that feed and republishes each change
//! through a [`Publisher`], at least once:
//!
//! - it remembers the last published sequence (its watermark) and skips
//!   anything at or below it, so a replayed feed is not republished
//! - a publish is retried a few times; if it still fails the relay stops
//!   with the watermark left on the last change that made it out
//! - a relay that fell behind the feed's buffer re-reads everything after
//!   its watermark from a [`ChangeSource`] before taking the next buffered
//!   change; the buffered copies it already sent are then skipped

use crate::types::{Transaction, TransactionId};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
}

/// One write to the `transaction` collection, with the record as it stood
/// right after the write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionChange {
    /// Monotonic per store, starting at 1
    pub sequence: u64,
    pub transaction_id: TransactionId,
    pub kind: ChangeKind,
    pub transaction: Transaction,
}

/// Ordered history of changes, read back after the live feed dropped some
pub trait ChangeSource: Send + Sync {
    /// Every change with a sequence above `watermark`, oldest first
    fn changes_since(&self, watermark: u64) -> Vec<TransactionChange>;
}

/// Downstream sink for transaction changes
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, change: &TransactionChange) -> anyhow::Result<()>;
}

/// Writes each change as a JSON body on the `payflow::relay` log target
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, change: &TransactionChange) -> anyhow::Result<()> {
        let body = serde_json::to_string(change).context("failed to encode transaction change")?;
        info!(
            target: "payflow::relay",
            sequence = change.sequence,
            transaction_id = %change.transaction_id,
            status = %change.transaction.status,
            body = %body,
            "transaction change"
        );
        Ok(())
    }
}

/// Forwards changes into a tokio mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<TransactionChange>,
}

impl ChannelPublisher {
    pub fn new(sender: mpsc::Sender<TransactionChange>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, change: &TransactionChange) -> anyhow::Result<()> {
        self.sender
            .send(change.clone())
            .await
            .map_err(|_| anyhow!("relay channel closed"))
    }
}

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Relay<P> {
    publisher: P,
    watermark: u64,
    attempts: u32,
    backoff: Duration,
}

impl<P: Publisher> Relay<P> {
    pub fn new(publisher: P) -> Self {
        Self::with_watermark(publisher, 0)
    }

    /// Resume after `watermark`; changes with a sequence at or below it are skipped
    pub fn with_watermark(publisher: P, watermark: u64) -> Self {
        Relay {
            publisher,
            watermark,
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    /// Sequence of the last change successfully published
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    #[cfg(test)]
    fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Publish one change unless it is at or below the watermark
    ///
    /// # Returns
    ///
    /// `true` if the change was published, `false` if it was skipped.
    pub async fn handle(&mut self, change: &TransactionChange) -> anyhow::Result<bool> {
        if change.sequence <= self.watermark {
            debug!(sequence = change.sequence, watermark = self.watermark, "skipping already relayed change");
            return Ok(false);
        }

        let mut attempt = 1;
        loop {
            match self.publisher.publish(change).await {
                Ok(()) => {
                    self.watermark = change.sequence;
                    return Ok(true);
                }
                Err(e) if attempt < self.attempts => {
                    warn!(sequence = change.sequence, attempt, error = %e, "publish failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => {
                    error!(sequence = change.sequence, watermark = self.watermark, error = %e, "publish failed, giving up");
                    return Err(e.context(format!(
                        "failed to relay change {} for transaction {}",
                        change.sequence, change.transaction_id
                    )));
                }
            }
        }
    }

    /// Publish everything `source` holds after the watermark
    ///
    /// Returns how many changes were published.
    pub async fn catch_up(&mut self, source: &dyn ChangeSource) -> anyhow::Result<usize> {
        let mut published = 0;
        for change in source.changes_since(self.watermark) {
            if self.handle(&change).await? {
                published += 1;
            }
        }
        Ok(published)
    }

    /// Drain `changes` until every sender is gone
    ///
    /// Changes the channel overwrote before they were read are recovered
    /// from `source`. Returns the final watermark.
    pub async fn run(
        &mut self,
        mut changes: broadcast::Receiver<TransactionChange>,
        source: &dyn ChangeSource,
    ) -> anyhow::Result<u64> {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    self.handle(&change).await?;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, watermark = self.watermark, "relay fell behind the change feed, catching up");
                    let recovered = self.catch_up(source).await?;
                    info!(recovered, watermark = self.watermark, "relay caught up");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.catch_up(source).await?;
                    debug!(watermark = self.watermark, "change feed closed");
                    return Ok(self.watermark);
                }
            }
        }
    }
}
