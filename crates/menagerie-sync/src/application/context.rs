//! Sync Context
//!
//! Explicitly constructed handle to the store, the session and the config.
//! Services are built from it; nothing is global.

use std::sync::Arc;

use menagerie::{Agent, AgentBackend, GraphStore, IdentityProvider, Record};

use super::{
    ChatSession, CollectionReader, CollectionView, PromptService, RelationalWriter,
    RequestSigner, SessionManager,
};
use crate::adapters::MemoryGraph;
use crate::config::SyncConfig;

#[derive(Clone)]
pub struct SyncContext {
    store: Arc<dyn GraphStore>,
    session: Arc<SessionManager>,
    config: SyncConfig,
}

impl SyncContext {
    pub fn new(
        store: Arc<dyn GraphStore>,
        identities: Arc<dyn IdentityProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            session: Arc::new(SessionManager::new(identities)),
            config,
        }
    }

    /// Graph and accounts both served by one in-memory replica
    pub fn with_memory_graph(graph: Arc<MemoryGraph>, config: SyncConfig) -> Self {
        Self::new(graph.clone(), graph, config)
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn reader(&self) -> CollectionReader {
        CollectionReader::new(self.store.clone(), self.session.clone(), self.config.read_timeout)
    }

    pub fn writer(&self) -> RelationalWriter {
        RelationalWriter::new(self.store.clone(), self.session.clone())
    }

    pub fn signer(&self) -> RequestSigner {
        RequestSigner::new(self.session.clone())
    }

    pub fn view<R: Record>(&self) -> CollectionView<R> {
        CollectionView::new(self.reader())
    }

    pub fn chat(&self, backend: Arc<dyn AgentBackend>, agent: Agent) -> ChatSession {
        ChatSession::new(backend, self.session.clone(), agent, self.config.history_limit)
    }

    pub fn prompts(&self, backend: Arc<dyn AgentBackend>) -> PromptService {
        PromptService::new(backend, self.session.clone())
    }

    /// Drop the live identity. Services built from this context fail with
    /// `NotAuthenticated` afterwards.
    pub fn teardown(&self) {
        self.session.logout();
        tracing::debug!("Sync context torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie::{DomainError, Pet, PetDraft};

    #[tokio::test]
    async fn test_context_wires_services_to_one_session() {
        let ctx = SyncContext::with_memory_graph(MemoryGraph::new(), SyncConfig::default());
        ctx.session().register("alice", "pw").await.unwrap();
        ctx.session().login("alice", "pw").await.unwrap();

        let saved = ctx.writer().save(PetDraft::new("Rex")).await.unwrap();
        let pets: Vec<Pet> = ctx.reader().read().await.unwrap();
        assert_eq!(pets[0].id, saved.id);

        ctx.teardown();
        assert!(matches!(
            ctx.reader().read::<Pet>().await,
            Err(DomainError::NotAuthenticated(_))
        ));
    }
}
