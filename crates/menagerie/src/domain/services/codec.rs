//! Record Codec
//!
//! Converts records to and from graph nodes. A node is a flat JSON object;
//! a tombstone is a missing node or one whose every field is null.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};

use crate::domain::entities::Record;
use crate::domain::errors::DomainError;

/// Field map of a graph node
pub type Node = Map<String, Value>;

const ID_SUFFIX_LEN: usize = 6;

/// `<prefix>_<6 random alphanumerics>`; the only source of new record ids
pub fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}_{}", prefix, suffix)
}

pub fn is_tombstone(node: &Node) -> bool {
    node.values().all(Value::is_null)
}

/// Serialize a record into node fields. `None` options are omitted so that
/// a merge-put leaves the stored value in place.
pub fn encode<R: Record>(record: &R) -> Result<Node, DomainError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DomainError::codec(
            R::KIND,
            format!("expected object, got {}", other),
        )),
        Err(e) => Err(DomainError::codec(R::KIND, e)),
    }
}

/// Decode a node reached through relation key `key`.
///
/// Absent and tombstoned nodes decode to `Ok(None)`. A missing `id` falls back
/// to `key`. Missing required fields is an `Err`; callers listing a relation
/// log and skip those.
pub fn decode<R: Record>(key: &str, node: Option<Node>) -> Result<Option<R>, DomainError> {
    let Some(mut node) = node else {
        return Ok(None);
    };
    if is_tombstone(&node) {
        return Ok(None);
    }

    let has_id = node
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !has_id {
        node.insert("id".to_string(), Value::String(key.to_string()));
    }

    // Null fields are partial tombstones; treat them as absent
    node.retain(|_, value| !value.is_null());
    R::fill_defaults(&mut node);

    serde_json::from_value(Value::Object(node))
        .map(Some)
        .map_err(|e| DomainError::codec(R::KIND, format!("{} ({})", e, key)))
}
