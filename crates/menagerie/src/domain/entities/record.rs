//! Record - common shape of graph-stored domain entities

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::RelationName;

/// A domain entity stored as an addressable graph node
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human readable kind, used in logs and errors
    const KIND: &'static str;

    /// Prefix of generated ids (`agent_xxxxxx`)
    const ID_PREFIX: &'static str;

    /// Relation this kind is listed under by default
    fn default_relation() -> RelationName;

    fn id(&self) -> &str;

    /// Fill defaults into a stored node before decoding.
    /// Runs after the id fallback, before required-field checks.
    fn fill_defaults(_node: &mut serde_json::Map<String, serde_json::Value>) {}
}

/// Unsaved or edited form of a record
///
/// `validate` is pure and local; the writer calls it before touching the store.
pub trait RecordDraft: Send {
    type Record: Record;

    /// Id of the record being edited, `None` when creating
    fn existing_id(&self) -> Option<&str>;

    /// Owner of the record being edited, if known. Ownership never changes on edit.
    fn existing_owner(&self) -> Option<&str> {
        None
    }

    fn validate(&self) -> Result<(), DomainError>;

    fn into_record(self, id: String, owner: String, stamp: Stamp) -> Result<Self::Record, DomainError>;
}

/// Timestamp applied by the writer: creation or update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    Created(DateTime<Utc>),
    Updated(DateTime<Utc>),
}

impl Stamp {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Stamp::Created(at) => Some(*at),
            Stamp::Updated(_) => None,
        }
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Stamp::Created(_) => None,
            Stamp::Updated(at) => Some(*at),
        }
    }
}

pub(crate) fn require_name(kind: &str, name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation(format!("{} name is required", kind)));
    }
    Ok(())
}
