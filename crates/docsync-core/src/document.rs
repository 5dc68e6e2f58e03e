//! Document model mapped to CRDT primitives.
//!
//! A document is a tagged union over the supported CRDT kinds plus a
//! version counter. Operations are dispatched to the primitive that matches
//! the document's kind; anything else is recorded but leaves the payload
//! untouched.

use crate::clock::Clock;
use crate::crdt::{LwwRegister, LwwWrite, OrSet};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Node identifier stamped on registers seeded with a bare value.
pub const SEED_NODE_ID: &str = "server";

/// Prefix of the synthetic tags minted for seeded set items.
pub const SEED_TAG_PREFIX: &str = "init:";

/// The CRDT kinds a document can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrdtType {
    /// Last-Writer-Wins register
    #[serde(rename = "lww")]
    Lww,
    /// Observed-Remove set
    #[serde(rename = "orset")]
    OrSet,
}

impl CrdtType {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CrdtType::Lww => "lww",
            CrdtType::OrSet => "orset",
        }
    }
}

impl std::fmt::Display for CrdtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrdtType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lww" => Ok(CrdtType::Lww),
            "orset" => Ok(CrdtType::OrSet),
            other => Err(StoreError::UnsupportedType(other.to_string())),
        }
    }
}

/// Initial state supplied when a document is created.
#[derive(Debug, Clone, PartialEq)]
pub enum Seed<V> {
    /// Explicit register state
    Write(LwwWrite<V>),
    /// Bare register value; timestamp and node are defaulted
    Value(V),
    /// Set items, each inserted under a synthetic tag
    Items(Vec<String>),
}

/// An instruction submitted against a document.
///
/// Serializes to the external form, e.g. `{"orset_add": {"item": .., "tag": ..}}`.
/// Bodies that match no known instruction are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationBody {
    /// Register write
    #[serde(rename = "lww_write")]
    LwwWrite(LwwWrite<Value>),
    /// Set insertion
    #[serde(rename = "orset_add")]
    OrSetAdd {
        /// Element identifier
        item: String,
        /// Tag unique to this insertion
        tag: String,
    },
    /// Set removal of observed tags
    #[serde(rename = "orset_remove")]
    OrSetRemove {
        /// Element identifier
        item: String,
        /// Tags the remover observed
        seen: Vec<String>,
    },
    /// Several instructions in one body. Each document applies the ones
    /// meant for its own kind.
    #[serde(untagged)]
    Combined(Instructions),
    /// Anything else
    #[serde(untagged)]
    Unrecognized(Value),
}

/// The instructions found in one multi-key operation body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instructions {
    /// Register write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lww_write: Option<LwwWrite<Value>>,
    /// Set insertion, applied before the removal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orset_add: Option<SetAdd>,
    /// Set removal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orset_remove: Option<SetRemove>,
}

/// Arguments of a set insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAdd {
    /// Element identifier
    pub item: String,
    /// Tag unique to this insertion
    pub tag: String,
}

/// Arguments of a set removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRemove {
    /// Element identifier
    pub item: String,
    /// Tags the remover observed
    pub seen: Vec<String>,
}

impl OperationBody {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            OperationBody::LwwWrite(_) => "lww_write",
            OperationBody::OrSetAdd { .. } => "orset_add",
            OperationBody::OrSetRemove { .. } => "orset_remove",
            OperationBody::Combined(_) => "combined",
            OperationBody::Unrecognized(_) => "unrecognized",
        }
    }

    /// Apply the register part of this body.
    ///
    /// Returns `false` when the body carries no register write.
    pub fn apply_to_register(&self, reg: &mut LwwRegister<Value>) -> bool {
        let write = match self {
            OperationBody::LwwWrite(write)
            | OperationBody::Combined(Instructions {
                lww_write: Some(write),
                ..
            }) => write,
            _ => return false,
        };
        reg.apply(write.clone());
        true
    }

    /// Apply the set part of this body, insertion first.
    ///
    /// Returns `false` when the body carries no set instruction.
    pub fn apply_to_set(&self, set: &mut OrSet) -> bool {
        match self {
            OperationBody::OrSetAdd { item, tag } => {
                set.add(item.as_str(), tag.as_str());
                true
            }
            OperationBody::OrSetRemove { item, seen } => {
                set.remove(item, seen);
                true
            }
            OperationBody::Combined(ins) => {
                if let Some(add) = &ins.orset_add {
                    set.add(add.item.as_str(), add.tag.as_str());
                }
                if let Some(remove) = &ins.orset_remove {
                    set.remove(&remove.item, &remove.seen);
                }
                ins.orset_add.is_some() || ins.orset_remove.is_some()
            }
            OperationBody::LwwWrite(_) | OperationBody::Unrecognized(_) => false,
        }
    }
}

/// A recorded operation. `seq` is the document version it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Resulting document version
    pub seq: i64,
    /// The instruction as submitted
    pub op: OperationBody,
}

/// Primitive state of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "state")]
pub(crate) enum Payload {
    /// Register state
    #[serde(rename = "lww")]
    Register(LwwRegister<Value>),
    /// Set state
    #[serde(rename = "orset")]
    Set(OrSet),
}

/// Externally consumable view of a document's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// Register value with its ordering metadata
    Register {
        /// Current value
        value: Value,
        /// Timestamp of the winning write
        ts: i64,
        /// Node of the winning write
        #[serde(rename = "nodeId")]
        node_id: String,
    },
    /// Present set items, ascending
    Set(Vec<String>),
}

/// A CRDT-backed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    version: i64,
    payload: Payload,
}

impl Document {
    /// Create a document at version 0.
    ///
    /// A seed whose shape does not fit `kind` is ignored. A register with no
    /// usable seed holds `null` stamped with the clock and [`SEED_NODE_ID`].
    #[must_use]
    pub fn new(kind: CrdtType, seed: Option<Seed<Value>>, clock: &dyn Clock) -> Self {
        let payload = match (kind, seed) {
            (CrdtType::Lww, Some(Seed::Write(write))) => Payload::Register(write.into()),
            (CrdtType::Lww, Some(Seed::Value(value))) => Payload::Register(LwwRegister::new(
                value,
                clock.now_nanos(),
                SEED_NODE_ID,
            )),
            (CrdtType::OrSet, Some(Seed::Items(items))) => {
                let mut set = OrSet::new();
                for item in items {
                    let tag = format!("{SEED_TAG_PREFIX}{item}");
                    set.add(item, tag);
                }
                Payload::Set(set)
            }
            (kind, seed) => {
                if seed.is_some() {
                    tracing::warn!(%kind, "Ignoring seed that does not fit document type");
                }
                match kind {
                    CrdtType::Lww => Payload::Register(LwwRegister::new(
                        Value::Null,
                        clock.now_nanos(),
                        SEED_NODE_ID,
                    )),
                    CrdtType::OrSet => Payload::Set(OrSet::new()),
                }
            }
        };

        Self {
            version: 0,
            payload,
        }
    }

    /// The document's CRDT kind.
    #[must_use]
    pub fn kind(&self) -> CrdtType {
        match self.payload {
            Payload::Register(_) => CrdtType::Lww,
            Payload::Set(_) => CrdtType::OrSet,
        }
    }

    /// Number of operations applied since creation.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Project the state into its external form.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        match &self.payload {
            Payload::Register(reg) => Snapshot::Register {
                value: reg.value.clone(),
                ts: reg.timestamp,
                node_id: reg.node_id.clone(),
            },
            Payload::Set(set) => Snapshot::Set(set.items()),
        }
    }

    /// Advance the version by one and return the new value.
    pub(crate) fn bump_version(&mut self) -> i64 {
        self.version += 1;
        self.version
    }

    /// Dispatch an operation body to the payload.
    ///
    /// Returns `false` when the body has no meaning for this document's kind.
    pub(crate) fn apply(&mut self, body: &OperationBody) -> bool {
        match &mut self.payload {
            Payload::Register(reg) => body.apply_to_register(reg),
            Payload::Set(set) => body.apply_to_set(set),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;

    #[test]
    fn crdt_type_parses_wire_names() {
        assert_eq!("lww".parse::<CrdtType>().unwrap(), CrdtType::Lww);
        assert_eq!("orset".parse::<CrdtType>().unwrap(), CrdtType::OrSet);
        assert!(matches!(
            "gcounter".parse::<CrdtType>(),
            Err(StoreError::UnsupportedType(kind)) if kind == "gcounter"
        ));
        assert_eq!(CrdtType::OrSet.to_string(), "orset");
    }

    #[test]
    fn register_seeded_with_bare_value() {
        let doc = Document::new(
            CrdtType::Lww,
            Some(Seed::Value(json!("hello"))),
            &FixedClock(99),
        );

        assert_eq!(doc.version(), 0);
        assert_eq!(
            doc.snapshot(),
            Snapshot::Register {
                value: json!("hello"),
                ts: 99,
                node_id: SEED_NODE_ID.to_string(),
            }
        );
    }

    #[test]
    fn register_seeded_with_explicit_write() {
        let write = LwwWrite::new(json!(1), 7, "n9");
        let doc = Document::new(CrdtType::Lww, Some(Seed::Write(write)), &FixedClock(0));

        let json = serde_json::to_value(doc.snapshot()).unwrap();
        assert_eq!(json, json!({ "value": 1, "ts": 7, "nodeId": "n9" }));
    }

    #[test]
    fn set_seeded_with_items_uses_synthetic_tags() {
        let doc = Document::new(
            CrdtType::OrSet,
            Some(Seed::Items(vec!["b".into(), "a".into()])),
            &FixedClock(0),
        );

        assert_eq!(doc.snapshot(), Snapshot::Set(vec!["a".into(), "b".into()]));
        let Payload::Set(set) = &doc.payload else {
            panic!("expected set payload");
        };
        assert!(set.tags("a").unwrap().contains("init:a"));
    }

    #[test]
    fn mismatched_seed_is_ignored() {
        let doc = Document::new(
            CrdtType::OrSet,
            Some(Seed::Value(json!("x"))),
            &FixedClock(0),
        );
        assert_eq!(doc.snapshot(), Snapshot::Set(Vec::new()));
    }

    #[test]
    fn body_for_other_kind_has_no_effect() {
        let mut doc = Document::new(CrdtType::OrSet, None, &FixedClock(0));
        let write = OperationBody::LwwWrite(LwwWrite::new(json!(1), 1, "n"));
        assert!(!doc.apply(&write));
        assert_eq!(doc.snapshot(), Snapshot::Set(Vec::new()));
    }

    #[test]
    fn combined_body_applies_the_part_for_each_kind() {
        let body = OperationBody::Combined(Instructions {
            lww_write: Some(LwwWrite::new(json!("w"), 5, "n1")),
            orset_add: Some(SetAdd {
                item: "a".into(),
                tag: "t1".into(),
            }),
            orset_remove: Some(SetRemove {
                item: "x".into(),
                seen: vec!["init:x".into()],
            }),
        });

        let mut set = Document::new(
            CrdtType::OrSet,
            Some(Seed::Items(vec!["x".into()])),
            &FixedClock(0),
        );
        assert!(set.apply(&body));
        assert_eq!(set.snapshot(), Snapshot::Set(vec!["a".into()]));

        let mut reg = Document::new(CrdtType::Lww, None, &FixedClock(0));
        assert!(reg.apply(&body));
        assert_eq!(
            reg.snapshot(),
            Snapshot::Register {
                value: json!("w"),
                ts: 5,
                node_id: "n1".into(),
            }
        );
    }

    #[test]
    fn combined_add_then_remove_of_same_tag_leaves_nothing() {
        let body = OperationBody::Combined(Instructions {
            lww_write: None,
            orset_add: Some(SetAdd {
                item: "a".into(),
                tag: "t1".into(),
            }),
            orset_remove: Some(SetRemove {
                item: "a".into(),
                seen: vec!["t1".into()],
            }),
        });
        let mut doc = Document::new(CrdtType::OrSet, None, &FixedClock(0));
        assert!(doc.apply(&body));
        assert_eq!(doc.snapshot(), Snapshot::Set(Vec::new()));

        let mut reg = Document::new(CrdtType::Lww, None, &FixedClock(0));
        assert!(!reg.apply(&body));
    }

    #[test]
    fn combined_body_wire_form() {
        let body = OperationBody::Combined(Instructions {
            lww_write: None,
            orset_add: Some(SetAdd {
                item: "a".into(),
                tag: "t1".into(),
            }),
            orset_remove: Some(SetRemove {
                item: "x".into(),
                seen: vec!["t0".into()],
            }),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({
                "orset_add": { "item": "a", "tag": "t1" },
                "orset_remove": { "item": "x", "seen": ["t0"] }
            })
        );
        assert_eq!(serde_json::from_value::<OperationBody>(json).unwrap(), body);
    }

    #[test]
    fn operation_body_external_form() {
        let add = OperationBody::OrSetAdd {
            item: "a".into(),
            tag: "t1".into(),
        };
        assert_eq!(
            serde_json::to_value(&add).unwrap(),
            json!({ "orset_add": { "item": "a", "tag": "t1" } })
        );

        let parsed: OperationBody = serde_json::from_value(json!({
            "lww_write": { "value": [1], "ts": 3, "nodeId": "n" }
        }))
        .unwrap();
        assert_eq!(
            parsed,
            OperationBody::LwwWrite(LwwWrite::new(json!([1]), 3, "n"))
        );

        let unknown: OperationBody = serde_json::from_value(json!({ "gc_inc": 1 })).unwrap();
        assert_eq!(unknown, OperationBody::Unrecognized(json!({ "gc_inc": 1 })));
        assert_eq!(
            serde_json::to_value(&unknown).unwrap(),
            json!({ "gc_inc": 1 })
        );
    }
}
