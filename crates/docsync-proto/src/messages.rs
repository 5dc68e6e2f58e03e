//! Wire messages exchanged over HTTP.

use docsync_core::{CrdtType, Document, Operation, Snapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create or replace a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutDocRequest {
    /// CRDT kind name (`"lww"` or `"orset"`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional seed state, interpreted per kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Value>,
}

/// A document's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocResponse {
    /// Current version
    pub version: i64,
    /// CRDT kind
    #[serde(rename = "type")]
    pub kind: CrdtType,
    /// Projected state
    pub snapshot: Snapshot,
}

impl From<&Document> for DocResponse {
    fn from(doc: &Document) -> Self {
        Self {
            version: doc.version(),
            kind: doc.kind(),
            snapshot: doc.snapshot(),
        }
    }
}

/// Append a batch of operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOpsRequest {
    /// Version the caller last saw; ops after it are echoed back
    #[serde(default)]
    pub since: i64,
    /// Untyped operation bodies, applied in order
    #[serde(default)]
    pub ops: Vec<Value>,
}

/// Result of appending operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOpsResponse {
    /// Version after the batch
    pub version: i64,
    /// Projected state after the batch
    pub snapshot: Snapshot,
    /// Logged operations with `seq > since`
    #[serde(default)]
    pub ops: Vec<Operation>,
}

/// Query string of the op-log route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpsSinceQuery {
    /// Exclusive lower bound on `seq`
    #[serde(default)]
    pub since: i64,
}

/// Op-log suffix of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsSinceResponse {
    /// Version at the time of the read
    pub version: i64,
    /// Operations with `seq > since`, in log order
    pub ops: Vec<Operation>,
}

/// Identifiers of every held document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocListResponse {
    /// Document ids, ascending
    pub ids: Vec<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
}

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when served
    pub status: String,
    /// Number of documents held
    pub documents: usize,
}

/// Encode a message as JSON bytes.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, MessageError> {
    serde_json::to_vec(message).map_err(|e| MessageError::Serialize(e.to_string()))
}

/// Decode a message from JSON bytes.
///
/// # Errors
///
/// Returns error if the bytes are not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MessageError> {
    serde_json::from_slice(bytes).map_err(|e| MessageError::Deserialize(e.to_string()))
}

/// Errors for message serialization/deserialization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MessageError {
    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Deserialization failed
    #[error("invalid json: {0}")]
    Deserialize(String),
}
