//! Shared fixtures for sync integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use menagerie::{
    DomainError, GraphStore, Namespace, Node, PendingAck, RelationName, RelationSnapshot,
};
use menagerie_sync::{MemoryGraph, SyncConfig, SyncContext};

/// Graph store wrapper that counts every call
pub struct CountingStore {
    inner: Arc<MemoryGraph>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<MemoryGraph>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphStore for CountingStore {
    fn put(&self, soul: &str, node: Option<Node>) -> PendingAck {
        self.count();
        self.inner.put(soul, node)
    }

    fn link(&self, namespace: &Namespace, relation: &RelationName, soul: &str) -> PendingAck {
        self.count();
        self.inner.link(namespace, relation, soul)
    }

    fn unlink(&self, namespace: &Namespace, relation: &RelationName, soul: &str) -> PendingAck {
        self.count();
        self.inner.unlink(namespace, relation, soul)
    }

    async fn get(&self, soul: &str) -> Result<Option<Node>, DomainError> {
        self.count();
        self.inner.get(soul).await
    }

    async fn members(
        &self,
        namespace: &Namespace,
        relation: &RelationName,
    ) -> Result<RelationSnapshot, DomainError> {
        self.count();
        self.inner.members(namespace, relation).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}

/// Context over a fresh replica with `alias` registered and logged in
pub async fn logged_in(graph: Arc<MemoryGraph>, alias: &str) -> SyncContext {
    let ctx = SyncContext::with_memory_graph(graph, SyncConfig::default());
    ctx.session().register(alias, "correct horse").await.unwrap();
    ctx.session().login(alias, "correct horse").await.unwrap();
    ctx
}
