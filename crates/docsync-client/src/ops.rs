//! Builders for operation bodies.

use docsync_core::document::SEED_TAG_PREFIX;
use docsync_core::{LwwWrite, Operation, OperationBody, OrSet};
use serde_json::Value;
use uuid::Uuid;

/// Mint a tag that is unique to one insertion.
#[must_use]
pub fn new_tag() -> String {
    Uuid::new_v4().to_string()
}

/// Add `item` to a set under a fresh tag.
#[must_use]
pub fn orset_add(item: impl Into<String>) -> OperationBody {
    OperationBody::OrSetAdd {
        item: item.into(),
        tag: new_tag(),
    }
}

/// Remove the observed `seen` tags of `item`.
#[must_use]
pub fn orset_remove(item: impl Into<String>, seen: Vec<String>) -> OperationBody {
    OperationBody::OrSetRemove {
        item: item.into(),
        seen,
    }
}

/// Write `value` to a register.
#[must_use]
pub fn lww_write(value: Value, ts: i64, node_id: impl Into<String>) -> OperationBody {
    OperationBody::LwwWrite(LwwWrite::new(value, ts, node_id))
}

/// Tags of `item` still live after replaying an op-log.
///
/// The synthetic tag a seeded item was created with is always included;
/// naming a tag that no longer exists is harmless.
#[must_use]
pub fn observed_tags(log: &[Operation], item: &str) -> Vec<String> {
    let mut set = OrSet::new();
    set.add(item, format!("{SEED_TAG_PREFIX}{item}"));
    for op in log {
        op.op.apply_to_set(&mut set);
    }
    set.tags(item)
        .map(|tags| tags.iter().cloned().collect())
        .unwrap_or_default()
}
