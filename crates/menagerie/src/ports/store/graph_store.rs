//! Graph Store Port
//!
//! Node-addressed get/put plus named relations scoped to an identity namespace.
//! Writes are optimistic: the local replica changes before the call returns,
//! and the returned [`PendingAck`] reports the store's verdict later.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::errors::{AckError, AckOperation, DomainError};
use crate::domain::services::Node;
use crate::domain::value_objects::{Namespace, RelationName};

/// Current members of a relation, as enumerated from the local view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationSnapshot {
    /// The relation node was never written
    Absent,
    /// Live member souls in insertion order
    Members(Vec<String>),
}

impl RelationSnapshot {
    pub fn into_members(self) -> Vec<String> {
        match self {
            RelationSnapshot::Absent => Vec::new(),
            RelationSnapshot::Members(members) => members,
        }
    }
}

/// Acknowledgment of a single write, resolved by the store.
/// Dropping it is fire-and-forget.
#[derive(Debug)]
pub struct PendingAck {
    rx: oneshot::Receiver<Result<(), AckError>>,
    operation: AckOperation,
    target: String,
}

/// Store-side handle that resolves a [`PendingAck`]
#[derive(Debug)]
pub struct Acknowledger {
    tx: oneshot::Sender<Result<(), AckError>>,
}

impl PendingAck {
    pub fn channel(operation: AckOperation, target: impl Into<String>) -> (Acknowledger, PendingAck) {
        let (tx, rx) = oneshot::channel();
        (
            Acknowledger { tx },
            PendingAck {
                rx,
                operation,
                target: target.into(),
            },
        )
    }

    /// An acknowledgment that is already decided
    pub fn ready(operation: AckOperation, target: impl Into<String>, result: Result<(), AckError>) -> Self {
        let (ack, pending) = Self::channel(operation, target);
        ack.resolve(result);
        pending
    }

    pub fn operation(&self) -> AckOperation {
        self.operation
    }

    pub async fn wait(self) -> Result<(), AckError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(AckError::new(
                self.operation,
                self.target,
                "store dropped the acknowledgment",
            )),
        }
    }
}

impl Acknowledger {
    pub fn resolve(self, result: Result<(), AckError>) {
        // Receiver gone means the writer chose fire-and-forget
        let _ = self.tx.send(result);
    }
}

/// Replicated graph store
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Merge `node` into the node at `soul`; `None` writes a tombstone
    fn put(&self, soul: &str, node: Option<Node>) -> PendingAck;

    /// Add `soul` to the relation under `namespace`
    fn link(&self, namespace: &Namespace, relation: &RelationName, soul: &str) -> PendingAck;

    /// Clear the edge to `soul` from the relation under `namespace`
    fn unlink(&self, namespace: &Namespace, relation: &RelationName, soul: &str) -> PendingAck;

    /// Resolve a node, local replica first, then peers.
    /// `None` covers both never-written and tombstoned nodes.
    async fn get(&self, soul: &str) -> Result<Option<Node>, DomainError>;

    /// Enumerate the relation's member keys
    async fn members(
        &self,
        namespace: &Namespace,
        relation: &RelationName,
    ) -> Result<RelationSnapshot, DomainError>;

    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_ack_resolves() {
        let ok = PendingAck::ready(AckOperation::Link, "toolbox", Ok(()));
        assert!(ok.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_acknowledger_is_error() {
        let (ack, pending) = PendingAck::channel(AckOperation::Put, "pet_1");
        drop(ack);
        let err = pending.wait().await.unwrap_err();
        assert_eq!(err.operation, AckOperation::Put);
        assert_eq!(err.target, "pet_1");
    }
}
