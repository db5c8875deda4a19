//! Generic concurrent document collection
//!
//! Backs the in-memory transaction and request stores. Documents live in a
//! `DashMap` keyed by a generated id, so operations on different documents
//! proceed in parallel while operations on the same document are serialized
//! by the map's shard locks. Each document remembers its insertion sequence
//! so listings come back in creation order.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug)]
struct Document<T> {
    sequence: u64,
    data: T,
}

/// Concurrent id -> document map with store-generated ids
#[derive(Debug)]
pub struct Collection<T> {
    documents: DashMap<String, Document<T>>,
    next_sequence: AtomicU64,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Insert a document under a fresh id and return the id
    pub fn insert(&self, data: T) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.documents
            .insert(id.clone(), Document { sequence, data });
        id
    }

    /// Clone of the document, if present
    pub fn get(&self, id: &str) -> Option<T> {
        self.documents.get(id).map(|entry| entry.value().data.clone())
    }

    /// Mutate a document in place and return the updated copy
    ///
    /// The closure runs while holding the document's shard lock.
    pub fn update<F>(&self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        self.documents.get_mut(id).map(|mut entry| {
            f(&mut entry.value_mut().data);
            entry.value().data.clone()
        })
    }

    pub fn remove(&self, id: &str) -> Option<T> {
        self.documents.remove(id).map(|(_, document)| document.data)
    }

    /// Documents matching `predicate`, in insertion order
    pub fn filter<P>(&self, predicate: P) -> Vec<(String, T)>
    where
        P: Fn(&T) -> bool,
    {
        let mut matches: Vec<(u64, String, T)> = self
            .documents
            .iter()
            .filter(|entry| predicate(&entry.value().data))
            .map(|entry| {
                (
                    entry.value().sequence,
                    entry.key().clone(),
                    entry.value().data.clone(),
                )
            })
            .collect();
        matches.sort_by_key(|(sequence, _, _)| *sequence);
        matches
            .into_iter()
            .map(|(_, id, data)| (id, data))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}
