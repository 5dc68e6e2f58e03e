//! Coercion of loosely-typed JSON into core operations and seeds.
//!
//! Clients send plain JSON. Fields are read leniently: a missing or mistyped
//! string becomes `""`, a missing or non-numeric timestamp becomes `0`, and
//! floating-point timestamps are truncated.

use docsync_core::{CrdtType, Instructions, LwwWrite, OperationBody, Seed, SetAdd, SetRemove};
use serde_json::{Map, Value};

/// Convert one JSON operation into a typed body.
///
/// The keys `lww_write`, `orset_add` and `orset_remove` are recognised when
/// their value is an object. A body with one of them maps to the matching
/// variant; a body with several keeps them all as
/// [`OperationBody::Combined`], leaving the document to pick the ones for
/// its kind. Anything else is kept as [`OperationBody::Unrecognized`].
#[must_use]
pub fn operation_from_json(raw: Value) -> OperationBody {
    let Some(obj) = raw.as_object() else {
        return OperationBody::Unrecognized(raw);
    };

    let instructions = Instructions {
        lww_write: obj
            .get("lww_write")
            .and_then(Value::as_object)
            .map(write_from_object),
        orset_add: obj
            .get("orset_add")
            .and_then(Value::as_object)
            .map(|add| SetAdd {
                item: string_field(add, "item"),
                tag: string_field(add, "tag"),
            }),
        orset_remove: obj
            .get("orset_remove")
            .and_then(Value::as_object)
            .map(|remove| SetRemove {
                item: string_field(remove, "item"),
                seen: string_list(remove.get("seen")),
            }),
    };

    match instructions {
        Instructions {
            lww_write: None,
            orset_add: None,
            orset_remove: None,
        } => OperationBody::Unrecognized(raw),
        Instructions {
            lww_write: Some(write),
            orset_add: None,
            orset_remove: None,
        } => OperationBody::LwwWrite(write),
        Instructions {
            lww_write: None,
            orset_add: Some(SetAdd { item, tag }),
            orset_remove: None,
        } => OperationBody::OrSetAdd { item, tag },
        Instructions {
            lww_write: None,
            orset_add: None,
            orset_remove: Some(SetRemove { item, seen }),
        } => OperationBody::OrSetRemove { item, seen },
        combined => OperationBody::Combined(combined),
    }
}

/// Interpret a create request's snapshot for the given kind.
///
/// - register: an object is an explicit `{value, ts, nodeId}` triple, any
///   other value is a bare value
/// - set: an array lists the initial items (non-strings skipped), anything
///   else seeds nothing
#[must_use]
pub fn seed_from_json(kind: CrdtType, snapshot: Option<&Value>) -> Option<Seed<Value>> {
    let snapshot = snapshot?;
    match kind {
        CrdtType::Lww => Some(match snapshot.as_object() {
            Some(obj) => Seed::Write(write_from_object(obj)),
            None => Seed::Value(snapshot.clone()),
        }),
        CrdtType::OrSet => snapshot
            .as_array()
            .map(|_| Seed::Items(string_list(Some(snapshot)))),
    }
}

fn write_from_object(obj: &Map<String, Value>) -> LwwWrite<Value> {
    LwwWrite::new(
        obj.get("value").cloned().unwrap_or(Value::Null),
        int_field(obj, "ts"),
        string_field(obj, "nodeId"),
    )
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[allow(clippy::cast_possible_truncation)]
fn int_field(obj: &Map<String, Value>, key: &str) -> i64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
        _ => 0,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
