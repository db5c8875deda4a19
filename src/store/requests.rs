//! In-memory `TransactionRequest` collection

use super::collection::Collection;
use crate::core::traits::RequestStore;
use crate::types::{PaymentError, RequestId, TransactionRequest};

/// Thread-safe in-memory request store
#[derive(Debug, Default)]
pub struct MemoryRequestStore {
    documents: Collection<TransactionRequest>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl RequestStore for MemoryRequestStore {
    fn insert(&self, request: TransactionRequest) -> Result<RequestId, PaymentError> {
        Ok(self.documents.insert(request))
    }

    fn set_id(&self, id: &str) -> Result<(), PaymentError> {
        self.documents
            .update(id, |request| request.id = Some(id.to_string()))
            .map(|_| ())
            .ok_or_else(|| PaymentError::request_not_found(id))
    }

    fn get(&self, id: &str) -> Result<Option<TransactionRequest>, PaymentError> {
        Ok(self.documents.get(id))
    }

    fn delete(&self, id: &str) -> Result<(), PaymentError> {
        self.documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PaymentError::request_not_found(id))
    }
}
