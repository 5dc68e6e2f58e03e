//! Request handling between the wire messages and the store.

use docsync_core::{CrdtType, MemoryStore, StoreError};
use docsync_proto::{
    operation_from_json, seed_from_json, DocListResponse, DocResponse, MessageError,
    OpsSinceResponse, PostOpsRequest, PostOpsResponse, PutDocRequest,
};
use std::sync::Arc;

/// Document operations in wire terms.
#[derive(Debug, Clone)]
pub struct DocService {
    store: Arc<MemoryStore>,
}

impl DocService {
    /// Create a service over a shared store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Create or replace a document.
    ///
    /// # Errors
    ///
    /// Returns error if the requested type is unsupported.
    pub fn put_doc(&self, doc_id: &str, req: PutDocRequest) -> Result<DocResponse, ServiceError> {
        let kind: CrdtType = req.kind.parse()?;
        let seed = seed_from_json(kind, req.snapshot.as_ref());
        let doc = self.store.create_or_replace(doc_id, kind.as_str(), seed)?;
        Ok(DocResponse::from(&doc))
    }

    /// Read a document.
    ///
    /// # Errors
    ///
    /// Returns error if the document does not exist.
    pub fn get_doc(&self, doc_id: &str) -> Result<DocResponse, ServiceError> {
        let doc = self.store.get(doc_id)?;
        Ok(DocResponse::from(&doc))
    }

    /// Append a batch of operations.
    ///
    /// # Errors
    ///
    /// Returns error if the document does not exist.
    pub fn post_ops(
        &self,
        doc_id: &str,
        req: PostOpsRequest,
    ) -> Result<PostOpsResponse, ServiceError> {
        let count = req.ops.len();
        let ops = req.ops.into_iter().map(operation_from_json);
        let (doc, log) = self.store.append_ops(doc_id, ops)?;

        tracing::info!(doc_id, ops = count, version = doc.version(), "Applied operations");

        let start = log.partition_point(|op| op.seq <= req.since);
        Ok(PostOpsResponse {
            version: doc.version(),
            snapshot: doc.snapshot(),
            ops: log[start..].to_vec(),
        })
    }

    /// Read the op-log after `since`.
    ///
    /// # Errors
    ///
    /// Returns error if the document does not exist.
    pub fn ops_since(&self, doc_id: &str, since: i64) -> Result<OpsSinceResponse, ServiceError> {
        let (version, ops) = self.store.log_since(doc_id, since)?;
        Ok(OpsSinceResponse { version, ops })
    }

    /// List every document id.
    #[must_use]
    pub fn list_docs(&self) -> DocListResponse {
        DocListResponse {
            ids: self.store.ids(),
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// Store rejected the request
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Request body could not be decoded
    #[error(transparent)]
    Message(#[from] MessageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_core::{FixedClock, Snapshot};
    use serde_json::json;

    fn service() -> DocService {
        DocService::new(Arc::new(MemoryStore::with_clock(Arc::new(FixedClock(7)))))
    }

    #[test]
    fn put_register_with_bare_value() {
        let svc = service();
        let res = svc
            .put_doc(
                "d1",
                PutDocRequest {
                    kind: "lww".into(),
                    snapshot: Some(json!("hello")),
                },
            )
            .unwrap();

        assert_eq!(res.version, 0);
        assert_eq!(
            res.snapshot,
            Snapshot::Register {
                value: json!("hello"),
                ts: 7,
                node_id: "server".into()
            }
        );
    }

    #[test]
    fn put_unknown_type_fails() {
        let svc = service();
        let err = svc
            .put_doc(
                "d1",
                PutDocRequest {
                    kind: "counter".into(),
                    snapshot: None,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::UnsupportedType(_))
        ));
    }

    #[test]
    fn post_ops_echoes_ops_after_since() {
        let svc = service();
        svc.put_doc(
            "d2",
            PutDocRequest {
                kind: "orset".into(),
                snapshot: None,
            },
        )
        .unwrap();

        let res = svc
            .post_ops(
                "d2",
                PostOpsRequest {
                    since: 1,
                    ops: vec![
                        json!({ "orset_add": { "item": "a", "tag": "t1" } }),
                        json!({ "orset_add": { "item": "b", "tag": "t2" } }),
                        json!({ "orset_remove": { "item": "a", "seen": ["t1"] } }),
                    ],
                },
            )
            .unwrap();

        assert_eq!(res.version, 3);
        assert_eq!(res.snapshot, Snapshot::Set(vec!["b".into()]));
        assert_eq!(res.ops.iter().map(|op| op.seq).collect::<Vec<_>>(), [2, 3]);
    }

    #[test]
    fn multi_key_op_on_set_applies_add_and_remove() {
        let svc = service();
        svc.put_doc(
            "s",
            PutDocRequest {
                kind: "orset".into(),
                snapshot: Some(json!(["x"])),
            },
        )
        .unwrap();

        let res = svc
            .post_ops(
                "s",
                PostOpsRequest {
                    since: 0,
                    ops: vec![
                        json!({
                            "lww_write": { "value": 1, "ts": 1, "nodeId": "n" },
                            "orset_add": { "item": "a", "tag": "t1" }
                        }),
                        json!({
                            "orset_add": { "item": "b", "tag": "t2" },
                            "orset_remove": { "item": "x", "seen": ["init:x"] }
                        }),
                    ],
                },
            )
            .unwrap();

        assert_eq!(res.version, 2);
        assert_eq!(res.snapshot, Snapshot::Set(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn ops_since_reports_version_and_suffix() {
        let svc = service();
        svc.put_doc(
            "r",
            PutDocRequest {
                kind: "lww".into(),
                snapshot: None,
            },
        )
        .unwrap();
        svc.post_ops(
            "r",
            PostOpsRequest {
                since: 0,
                ops: vec![json!({ "lww_write": { "value": 1, "ts": 9, "nodeId": "n" } }); 3],
            },
        )
        .unwrap();

        let res = svc.ops_since("r", 1).unwrap();
        assert_eq!(res.version, 3);
        assert_eq!(res.ops.iter().map(|op| op.seq).collect::<Vec<_>>(), [2, 3]);
    }

    #[test]
    fn list_docs_is_sorted() {
        let svc = service();
        for id in ["b", "a"] {
            svc.put_doc(
                id,
                PutDocRequest {
                    kind: "orset".into(),
                    snapshot: None,
                },
            )
            .unwrap();
        }
        assert_eq!(svc.list_docs().ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn ops_since_on_missing_doc_fails() {
        let svc = service();
        assert!(matches!(
            svc.ops_since("ghost", 0),
            Err(ServiceError::Store(StoreError::NotFound(_)))
        ));
    }
}
