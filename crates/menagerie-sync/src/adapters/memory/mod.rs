//! In-Memory Replicated Graph
//!
//! A local replica with optional peers. Local writes apply immediately and are
//! pushed to peers after a per-peer propagation delay, so two replicas only
//! converge eventually. Reads fall back to peers for souls the local replica
//! has never seen.
//!
//! Test hooks: connectivity switch, per-soul read latency, and queued ack
//! failures per operation.

mod accounts;
mod replica;

pub use replica::{Account, NodeLookup, Replica};

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use menagerie::{
    AckError, AckOperation, DomainError, GraphStore, Namespace, Node, PendingAck, RelationName,
    RelationSnapshot,
};

struct Peer {
    graph: Weak<MemoryGraph>,
    latency: Duration,
}

/// Replicated operation pushed to peers
#[derive(Clone)]
enum Op {
    Put(String, Option<Node>),
    Link(Namespace, RelationName, String),
    Unlink(Namespace, RelationName, String),
    Account(String, Account),
}

/// In-memory peer of the replicated graph
pub struct MemoryGraph {
    replica: RwLock<Replica>,
    peers: RwLock<Vec<Peer>>,
    connected: AtomicBool,
    read_latency: RwLock<HashMap<String, Duration>>,
    faults: Mutex<HashMap<AckOperation, VecDeque<String>>>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::with_replica(Replica::default())
    }
}

impl MemoryGraph {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replica(replica: Replica) -> Self {
        Self {
            replica: RwLock::new(replica),
            peers: RwLock::new(Vec::new()),
            connected: AtomicBool::new(true),
            read_latency: RwLock::new(HashMap::new()),
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Open a replica persisted with [`MemoryGraph::save_snapshot`]; a missing file starts empty
    pub fn open(path: &Path) -> Result<Arc<Self>, DomainError> {
        if !path.exists() {
            tracing::debug!("No replica at {:?}, starting empty", path);
            return Ok(Self::new());
        }
        let replica = Replica::load(path)?;
        tracing::debug!(
            "Loaded replica from {:?} ({} nodes, {} accounts)",
            path,
            replica.nodes.len(),
            replica.accounts.len()
        );
        Ok(Arc::new(Self::with_replica(replica)))
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<(), DomainError> {
        self.replica.read().save(path)
    }

    pub fn snapshot(&self) -> Replica {
        self.replica.read().clone()
    }

    /// Connect two replicas both ways with the same propagation delay
    pub fn connect_peers(a: &Arc<Self>, b: &Arc<Self>, latency: Duration) {
        a.peers.write().push(Peer {
            graph: Arc::downgrade(b),
            latency,
        });
        b.peers.write().push(Peer {
            graph: Arc::downgrade(a),
            latency,
        });
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Delay every `get` of `soul` by `latency`
    pub fn set_read_latency(&self, soul: &str, latency: Duration) {
        self.read_latency.write().insert(soul.to_string(), latency);
    }

    /// Reject the next `operation` with `detail`; the rejected write is not applied
    pub fn fail_next(&self, operation: AckOperation, detail: impl Into<String>) {
        self.faults
            .lock()
            .entry(operation)
            .or_default()
            .push_back(detail.into());
    }

    /// Node as the local replica sees it, without peer fallback
    pub fn local_lookup(&self, soul: &str) -> NodeLookup {
        self.replica.read().lookup(soul)
    }

    fn take_fault(&self, operation: AckOperation) -> Option<String> {
        self.faults.lock().get_mut(&operation)?.pop_front()
    }

    fn check_write(&self, operation: AckOperation, target: &str) -> Result<(), AckError> {
        if !self.is_connected() {
            return Err(AckError::new(operation, target, "store is offline"));
        }
        match self.take_fault(operation) {
            Some(detail) => Err(AckError::new(operation, target, detail)),
            None => Ok(()),
        }
    }

    fn apply(&self, op: &Op) {
        let mut replica = self.replica.write();
        match op {
            Op::Put(soul, node) => replica.apply_put(soul, node.clone()),
            Op::Link(ns, relation, soul) => replica.apply_link(ns, relation, soul),
            Op::Unlink(ns, relation, soul) => replica.apply_unlink(ns, relation, soul),
            Op::Account(alias, account) => replica.apply_account(alias, account.clone()),
        }
    }

    /// Claim `alias` in the local replica and replicate the account.
    /// Returns `false` if the alias was already taken here.
    fn claim_account(&self, alias: &str, account: Account) -> bool {
        if !self.replica.write().insert_account(alias, account.clone()) {
            return false;
        }
        self.write(Op::Account(alias.to_string(), account));
        true
    }

    /// Apply locally, then schedule delivery to every live peer
    fn write(&self, op: Op) {
        self.apply(&op);

        let peers: Vec<(Arc<MemoryGraph>, Duration)> = self
            .peers
            .read()
            .iter()
            .filter_map(|peer| peer.graph.upgrade().map(|graph| (graph, peer.latency)))
            .collect();

        for (peer, latency) in peers {
            let op = op.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) if !latency.is_zero() => {
                    handle.spawn(async move {
                        tokio::time::sleep(latency).await;
                        peer.apply(&op);
                    });
                }
                _ => peer.apply(&op),
            }
        }
    }

    fn acked(&self, operation: AckOperation, target: &str, op: Op) -> PendingAck {
        let result = self.check_write(operation, target);
        match &result {
            Ok(()) => self.write(op),
            Err(e) => tracing::warn!("{}", e),
        }
        PendingAck::ready(operation, target, result)
    }

    fn live_peers(&self) -> Vec<Arc<MemoryGraph>> {
        self.peers
            .read()
            .iter()
            .filter_map(|peer| peer.graph.upgrade())
            .collect()
    }

    fn ensure_connected(&self) -> Result<(), DomainError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DomainError::StoreUnavailable("store is offline".to_string()))
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    fn put(&self, soul: &str, node: Option<Node>) -> PendingAck {
        self.acked(AckOperation::Put, soul, Op::Put(soul.to_string(), node))
    }

    fn link(&self, namespace: &Namespace, relation: &RelationName, soul: &str) -> PendingAck {
        self.acked(
            AckOperation::Link,
            relation.as_str(),
            Op::Link(namespace.clone(), relation.clone(), soul.to_string()),
        )
    }

    fn unlink(&self, namespace: &Namespace, relation: &RelationName, soul: &str) -> PendingAck {
        self.acked(
            AckOperation::Unlink,
            relation.as_str(),
            Op::Unlink(namespace.clone(), relation.clone(), soul.to_string()),
        )
    }

    async fn get(&self, soul: &str) -> Result<Option<Node>, DomainError> {
        self.ensure_connected()?;

        let latency = self.read_latency.read().get(soul).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.local_lookup(soul) {
            NodeLookup::Live(node) => return Ok(Some(node)),
            NodeLookup::Tombstone => return Ok(None),
            NodeLookup::Unknown => {}
        }

        for peer in self.live_peers() {
            match peer.local_lookup(soul) {
                NodeLookup::Live(node) => return Ok(Some(node)),
                NodeLookup::Tombstone => return Ok(None),
                NodeLookup::Unknown => {}
            }
        }
        Ok(None)
    }

    async fn members(
        &self,
        namespace: &Namespace,
        relation: &RelationName,
    ) -> Result<RelationSnapshot, DomainError> {
        self.ensure_connected()?;

        let local = self.replica.read().snapshot(namespace, relation);
        if local != RelationSnapshot::Absent {
            return Ok(local);
        }
        for peer in self.live_peers() {
            let remote = peer.replica.read().snapshot(namespace, relation);
            if remote != RelationSnapshot::Absent {
                return Ok(remote);
            }
        }
        Ok(RelationSnapshot::Absent)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Option<Node> {
        value.as_object().cloned()
    }

    #[tokio::test]
    async fn test_put_is_visible_locally_at_once() {
        let graph = MemoryGraph::new();
        let _ = graph.put("agent_1", fields(json!({"name": "Scout"})));
        let node = graph.get("agent_1").await.unwrap().unwrap();
        assert_eq!(node["name"], "Scout");
    }

    #[tokio::test]
    async fn test_injected_fault_rejects_and_skips_write() {
        let graph = MemoryGraph::new();
        let ns = Namespace::for_public_key("k");
        graph.fail_next(AckOperation::Link, "quota exceeded");

        let err = graph
            .link(&ns, &RelationName::toolbox(), "pet_1")
            .wait()
            .await
            .unwrap_err();
        assert_eq!(err.detail, "quota exceeded");
        assert_eq!(
            graph.members(&ns, &RelationName::toolbox()).await.unwrap(),
            RelationSnapshot::Absent
        );

        // Only the next operation fails
        assert!(graph.link(&ns, &RelationName::toolbox(), "pet_1").wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_offline_store_rejects() {
        let graph = MemoryGraph::new();
        graph.set_connected(false);
        assert!(graph.put("a", None).wait().await.is_err());
        assert!(matches!(graph.get("a").await, Err(DomainError::StoreUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_peers_converge_after_latency() {
        let a = MemoryGraph::new();
        let b = MemoryGraph::new();
        MemoryGraph::connect_peers(&a, &b, Duration::from_millis(200));

        let _ = a.put("pet_1", fields(json!({"name": "Rex"})));
        assert_eq!(b.local_lookup("pet_1"), NodeLookup::Unknown);
        // Unknown locally, so b falls back to its peer
        assert!(b.get("pet_1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(matches!(b.local_lookup("pet_1"), NodeLookup::Live(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_relation_seen_after_propagation() {
        let a = MemoryGraph::new();
        let b = MemoryGraph::new();
        MemoryGraph::connect_peers(&a, &b, Duration::from_millis(100));
        let ns = Namespace::for_public_key("k");

        let _ = b.members(&ns, &RelationName::agents()).await.unwrap();
        a.link(&ns, &RelationName::agents(), "agent_1").wait().await.unwrap();
        a.link(&ns, &RelationName::agents(), "agent_2").wait().await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            b.members(&ns, &RelationName::agents()).await.unwrap().into_members(),
            vec!["agent_1".to_string(), "agent_2".to_string()]
        );
    }
}
