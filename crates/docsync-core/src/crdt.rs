//! CRDT primitives for docsync.
//!
//! Provides a Last-Writer-Wins register and an Observed-Remove set. Both
//! implement [`Crdt`], whose merge forms a join-semilattice.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// State-based CRDT.
///
/// Implementations must satisfy:
/// - **Commutativity:** `a.merge(b) == b.merge(a)`
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotence:** `a.merge(a) == a`
pub trait Crdt {
    /// Merge another replica's state into this one.
    fn merge(&mut self, other: &Self);
}

/// A single write against a [`LwwRegister`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LwwWrite<V> {
    /// The value to store
    pub value: V,
    /// Logical timestamp (Lamport or HLC, caller's choice)
    #[serde(rename = "ts")]
    pub timestamp: i64,
    /// Writer identity, breaks timestamp ties
    #[serde(rename = "nodeId")]
    pub node_id: String,
}

impl<V> LwwWrite<V> {
    /// Create a new write.
    #[must_use]
    pub fn new(value: V, timestamp: i64, node_id: impl Into<String>) -> Self {
        Self {
            value,
            timestamp,
            node_id: node_id.into(),
        }
    }
}

/// A Last-Writer-Wins register.
///
/// The register holds the write with the greatest `(timestamp, node_id)`
/// pair it has seen, compared lexicographically with the timestamp first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LwwRegister<V> {
    /// The stored value, opaque to the register
    pub value: V,
    /// Timestamp of the winning write
    #[serde(rename = "ts")]
    pub timestamp: i64,
    /// Node that issued the winning write
    #[serde(rename = "nodeId")]
    pub node_id: String,
}

impl<V> LwwRegister<V> {
    /// Create a register holding an initial value.
    #[must_use]
    pub fn new(value: V, timestamp: i64, node_id: impl Into<String>) -> Self {
        Self {
            value,
            timestamp,
            node_id: node_id.into(),
        }
    }

    /// Apply a write if it orders strictly after the current state.
    ///
    /// Returns `true` if the register was updated.
    pub fn apply(&mut self, write: LwwWrite<V>) -> bool {
        if (write.timestamp, write.node_id.as_str()) > (self.timestamp, self.node_id.as_str()) {
            self.value = write.value;
            self.timestamp = write.timestamp;
            self.node_id = write.node_id;
            true
        } else {
            false
        }
    }
}

impl<V: Clone> LwwRegister<V> {
    /// The current state expressed as a write.
    #[must_use]
    pub fn to_write(&self) -> LwwWrite<V> {
        LwwWrite {
            value: self.value.clone(),
            timestamp: self.timestamp,
            node_id: self.node_id.clone(),
        }
    }
}

impl<V> From<LwwWrite<V>> for LwwRegister<V> {
    fn from(write: LwwWrite<V>) -> Self {
        Self {
            value: write.value,
            timestamp: write.timestamp,
            node_id: write.node_id,
        }
    }
}

impl<V: Clone> Crdt for LwwRegister<V> {
    fn merge(&mut self, other: &Self) {
        self.apply(other.to_write());
    }
}

/// An Observed-Remove set of string items.
///
/// Every insertion carries a unique tag. An item is present while at least
/// one of its tags survives; a remove only retracts the tags it names, so an
/// add the remover never observed wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrSetState")]
pub struct OrSet {
    /// item -> live tags. Never holds an empty tag set.
    elements: BTreeMap<String, BTreeSet<String>>,
}

/// Decoded set state, checked before it becomes an [`OrSet`].
#[derive(Deserialize)]
struct OrSetState {
    elements: BTreeMap<String, BTreeSet<String>>,
}

impl TryFrom<OrSetState> for OrSet {
    type Error = EmptyTagSet;

    fn try_from(state: OrSetState) -> Result<Self, Self::Error> {
        if let Some((item, _)) = state.elements.iter().find(|(_, tags)| tags.is_empty()) {
            return Err(EmptyTagSet(item.clone()));
        }
        Ok(Self {
            elements: state.elements,
        })
    }
}

/// A decoded set listed an item without any live tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("set item {0:?} has no tags")]
pub struct EmptyTagSet(pub String);

impl OrSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tag` into `item`'s tag set.
    ///
    /// Returns `true` if the tag was not already present.
    pub fn add(&mut self, item: impl Into<String>, tag: impl Into<String>) -> bool {
        self.elements
            .entry(item.into())
            .or_default()
            .insert(tag.into())
    }

    /// Retract the `seen` tags from `item`.
    ///
    /// Unknown tags are ignored. The item is dropped once its last tag goes.
    /// Returns `true` if the item stopped being present.
    pub fn remove<I, S>(&mut self, item: &str, seen: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(tags) = self.elements.get_mut(item) else {
            return false;
        };
        for tag in seen {
            tags.remove(tag.as_ref());
        }
        if tags.is_empty() {
            self.elements.remove(item);
            true
        } else {
            false
        }
    }

    /// Check whether an item is present.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        self.elements.contains_key(item)
    }

    /// The live tags of an item, if present.
    #[must_use]
    pub fn tags(&self, item: &str) -> Option<&BTreeSet<String>> {
        self.elements.get(item)
    }

    /// Present items in ascending order.
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        self.elements.keys().cloned().collect()
    }

    /// Number of present items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if no item is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Crdt for OrSet {
    fn merge(&mut self, other: &Self) {
        for (item, tags) in &other.elements {
            self.elements
                .entry(item.clone())
                .or_default()
                .extend(tags.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(value: &str, ts: i64, node: &str) -> LwwRegister<String> {
        LwwRegister::new(value.to_string(), ts, node)
    }

    #[test]
    fn lww_register_higher_timestamp_wins() {
        let mut reg = register("a", 1, "n1");

        assert!(reg.apply(LwwWrite::new("b".to_string(), 2, "n1")));
        assert_eq!(reg.value, "b");

        // Earlier timestamp should not update
        assert!(!reg.apply(LwwWrite::new("c".to_string(), 1, "zzz")));
        assert_eq!(reg.value, "b");
        assert_eq!(reg.timestamp, 2);
    }

    #[test]
    fn lww_register_node_id_breaks_ties() {
        let a = LwwWrite::new("from-a".to_string(), 5, "a");
        let b = LwwWrite::new("from-b".to_string(), 5, "b");

        let mut first = register("init", 0, "");
        first.apply(a.clone());
        first.apply(b.clone());

        let mut second = register("init", 0, "");
        second.apply(b);
        second.apply(a);

        assert_eq!(first, second);
        assert_eq!(first.value, "from-b");
        assert_eq!(first.node_id, "b");
    }

    #[test]
    fn lww_register_equal_write_is_ignored() {
        let mut reg = register("kept", 7, "n");
        assert!(!reg.apply(LwwWrite::new("other".to_string(), 7, "n")));
        assert_eq!(reg.value, "kept");
    }

    #[test]
    fn lww_register_merge_with_older_is_noop() {
        let newer = register("new", 10, "a");
        let older = register("old", 3, "z");

        let mut merged = newer.clone();
        merged.merge(&older);
        assert_eq!(merged, newer);

        let mut merged = newer.clone();
        merged.merge(&newer);
        assert_eq!(merged, newer);
    }

    #[test]
    fn lww_register_serializes_wire_names() {
        let reg = register("v", 10, "n1");
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "value": "v", "ts": 10, "nodeId": "n1" })
        );
    }

    #[test]
    fn orset_repeated_add_is_idempotent() {
        let mut set = OrSet::new();
        assert!(set.add("x", "t1"));
        assert!(!set.add("x", "t1"));
        assert_eq!(set.tags("x").map(BTreeSet::len), Some(1));
    }

    #[test]
    fn orset_add_wins_over_unobserved_tag() {
        let mut set = OrSet::new();
        set.add("x", "t1");
        set.remove("x", ["t1"]);
        set.add("x", "t2");

        assert!(set.contains("x"));
        assert_eq!(set.items(), vec!["x".to_string()]);
    }

    #[test]
    fn orset_remove_drops_empty_entries() {
        let mut set = OrSet::new();
        set.add("x", "t1");
        set.add("x", "t2");

        assert!(!set.remove("x", ["t1", "unknown"]));
        assert!(set.contains("x"));

        assert!(set.remove("x", ["t2"]));
        assert!(!set.contains("x"));
        assert!(set.tags("x").is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn orset_remove_missing_item_is_noop() {
        let mut set = OrSet::new();
        set.add("a", "t1");
        assert!(!set.remove("b", ["t1"]));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn orset_merge_unions_tags() {
        let mut a = OrSet::new();
        a.add("x", "t1");
        a.add("y", "t3");

        let mut b = OrSet::new();
        b.add("x", "t2");

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.items(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(ab.tags("x").map(BTreeSet::len), Some(2));
    }

    #[test]
    fn orset_decoding_rejects_items_without_tags() {
        let err = serde_json::from_value::<OrSet>(serde_json::json!({
            "elements": { "x": [], "y": ["t1"] }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("set item \"x\" has no tags"));

        let mut set = OrSet::new();
        set.add("y", "t1");
        let decoded: OrSet = serde_json::from_value(serde_json::to_value(&set).unwrap()).unwrap();
        assert_eq!(decoded, set);
    }
}
