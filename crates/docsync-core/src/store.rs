//! Versioned in-memory document store.
//!
//! The store owns every document and its append-only operation log. A single
//! read/write lock guards the whole table: reads share, mutations are
//! exclusive, so a reader never sees a half-applied batch and two batches on
//! the same document never interleave their version increments.

use crate::clock::{Clock, SystemClock};
use crate::document::{CrdtType, Document, Operation, OperationBody, Seed};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct Entry {
    doc: Document,
    log: Vec<Operation>,
}

/// In-memory store of CRDT documents.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store with a custom clock for seed timestamps.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Create a document, replacing any previous one and its log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedType`] if `kind` names no known CRDT.
    pub fn create_or_replace(
        &self,
        id: &str,
        kind: &str,
        seed: Option<Seed<Value>>,
    ) -> Result<Document, StoreError> {
        let kind: CrdtType = kind.parse()?;
        let doc = Document::new(kind, seed, self.clock.as_ref());

        let replaced = self
            .entries
            .write()
            .insert(
                id.to_string(),
                Entry {
                    doc: doc.clone(),
                    log: Vec::new(),
                },
            )
            .is_some();

        tracing::info!(doc_id = id, %kind, replaced, "Created document");
        Ok(doc)
    }

    /// Get a copy of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document exists under `id`.
    pub fn get(&self, id: &str) -> Result<Document, StoreError> {
        self.entries
            .read()
            .get(id)
            .map(|entry| entry.doc.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Apply a batch of operations in order.
    ///
    /// Every body advances the version and is logged, including bodies that
    /// have no effect on the document's payload.
    ///
    /// Returns the updated document and its full log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] before applying anything if no
    /// document exists under `id`.
    pub fn append_ops(
        &self,
        id: &str,
        ops: impl IntoIterator<Item = OperationBody>,
    ) -> Result<(Document, Vec<Operation>), StoreError> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let before = entry.doc.version();
        for body in ops {
            let seq = entry.doc.bump_version();
            if !entry.doc.apply(&body) {
                tracing::debug!(
                    doc_id = id,
                    seq,
                    kind = %entry.doc.kind(),
                    op = body.name(),
                    "Operation has no effect on document type"
                );
            }
            entry.log.push(Operation { seq, op: body });
        }

        tracing::debug!(
            doc_id = id,
            from_version = before,
            version = entry.doc.version(),
            "Appended operations"
        );
        Ok((entry.doc.clone(), entry.log.clone()))
    }

    /// Operations with `seq` strictly greater than `version`, in log order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document exists under `id`.
    pub fn ops_since(&self, id: &str, version: i64) -> Result<Vec<Operation>, StoreError> {
        self.log_since(id, version).map(|(_, ops)| ops)
    }

    /// The current version together with the operations after `version`,
    /// read under one lock so the two always agree.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document exists under `id`.
    pub fn log_since(&self, id: &str, version: i64) -> Result<(i64, Vec<Operation>), StoreError> {
        let entries = self.entries.read();
        let entry = entries
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        // The log is sorted by seq, starting at 1.
        let start = entry.log.partition_point(|op| op.seq <= version);
        Ok((entry.doc.version(), entry.log[start..].to_vec()))
    }

    /// Identifiers of all documents, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Errors returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No document under the identifier
    #[error("document not found: {0}")]
    NotFound(String),
    /// The requested CRDT kind is not supported
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
}
