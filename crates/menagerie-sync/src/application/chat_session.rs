//! Chat Session (Use Case)
//!
//! Conversation with one agent. Every turn, including failures, is kept in the
//! transcript; the most recent turns go to the backend as context.

use std::sync::Arc;

use menagerie::{
    history_window, Agent, AgentBackend, ConversationTurn, DomainError, Endpoint, Identity,
    InvocationContext, InvokeAgentRequest, InvokeAgentResponse,
};

use super::{RequestSigner, SessionManager};

pub struct ChatSession {
    backend: Arc<dyn AgentBackend>,
    session: Arc<SessionManager>,
    agent: Agent,
    history: Vec<ConversationTurn>,
    history_limit: usize,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        session: Arc<SessionManager>,
        agent: Agent,
        history_limit: usize,
    ) -> Self {
        Self {
            backend,
            session,
            agent,
            history: Vec::new(),
            history_limit,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Switching to a different agent starts a fresh conversation
    pub fn switch_agent(&mut self, agent: Agent) {
        if agent.id != self.agent.id {
            self.history.clear();
        }
        self.agent = agent;
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Send a user message and wait for the reply.
    /// On failure a system turn describing the error is appended.
    pub async fn send(&mut self, message: &str) -> Result<String, DomainError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::validation("Message is empty"));
        }

        self.history.push(ConversationTurn::user(message));
        let result = self.invoke(message).await;
        match &result {
            Ok(reply) => self.history.push(ConversationTurn::agent(reply.clone())),
            Err(e) => {
                tracing::warn!("Agent {} invocation failed: {}", self.agent.id, e);
                self.history.push(ConversationTurn::system(failure_text(e)));
            }
        }
        result
    }

    async fn invoke(&self, message: &str) -> Result<String, DomainError> {
        let identity = self.session.require()?;
        // The window includes the message being sent
        let request = self.build_request(&identity, message);

        let signed = RequestSigner::sign_as(Some(&identity), &request)?;
        let response = self.backend.post_signed(Endpoint::InvokeAgent, &signed).await?;
        let parsed: InvokeAgentResponse = serde_json::from_value(response)
            .map_err(|e| DomainError::Backend(format!("Unexpected reply shape: {e}")))?;
        Ok(parsed.reply)
    }

    fn build_request(&self, identity: &Identity, message: &str) -> InvokeAgentRequest {
        InvokeAgentRequest {
            user_id: identity.public_key().to_hex(),
            agent_id: self.agent.id.clone(),
            agent_definition: (&self.agent).into(),
            message: message.to_string(),
            context: InvocationContext {
                conversation_history: history_window(&self.history, self.history_limit),
            },
        }
    }
}

/// Backend errors are already display text; anything else gets a prefix
fn failure_text(error: &DomainError) -> String {
    match error {
        DomainError::Backend(message) => message.clone(),
        other => format!("Error: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryGraph;
    use async_trait::async_trait;
    use menagerie::{AgentDraft, PublicKey, RecordDraft, Sender, SignedPayload, Stamp};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    /// Verifies like the real backend, then echoes
    #[derive(Default)]
    struct EchoBackend {
        seen: Mutex<Vec<Value>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl AgentBackend for EchoBackend {
        async fn post_signed(&self, endpoint: Endpoint, payload: &SignedPayload) -> Result<Value, DomainError> {
            assert_eq!(endpoint, Endpoint::InvokeAgent);
            let body: Value = serde_json::from_str(&payload.body).unwrap();
            let key = PublicKey::from_hex(body["userId"].as_str().unwrap()).unwrap();
            if !RequestSigner::verify(&key, payload) {
                return Err(DomainError::Backend("Signature verification failed".into()));
            }
            self.seen.lock().push(body.clone());
            if let Some(error) = &self.fail_with {
                return Err(DomainError::Backend(error.clone()));
            }
            Ok(json!({"reply": format!("echo: {}", body["message"].as_str().unwrap())}))
        }
    }

    fn agent(id: &str) -> Agent {
        AgentDraft::new("Scout")
            .with_system_prompt("Be brief")
            .into_record(id.into(), "owner".into(), Stamp::Created(chrono::Utc::now()))
            .unwrap()
    }

    async fn logged_in() -> Arc<SessionManager> {
        let graph = MemoryGraph::new();
        let session = Arc::new(SessionManager::new(graph));
        session.register("alice", "pw").await.unwrap();
        session.login("alice", "pw").await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_send_records_both_turns() {
        let backend = Arc::new(EchoBackend::default());
        let mut chat = ChatSession::new(backend.clone(), logged_in().await, agent("agent_aaaaaa"), 20);

        let reply = chat.send("hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
        assert_eq!(chat.history().len(), 2);
        assert_eq!(chat.history()[0].sender, Sender::User);
        assert_eq!(chat.history()[1].sender, Sender::Agent);

        chat.send("again").await.unwrap();
        let seen = backend.seen.lock();
        assert_eq!(seen[1]["agentDefinition"]["system_prompt"], "Be brief");
        assert_eq!(
            seen[1]["context"]["conversation_history"],
            json!([
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "echo: hello"},
                {"role": "user", "content": "again"}
            ])
        );
    }

    #[tokio::test]
    async fn test_history_is_windowed() {
        let backend = Arc::new(EchoBackend::default());
        let mut chat = ChatSession::new(backend.clone(), logged_in().await, agent("agent_aaaaaa"), 3);
        for i in 0..4 {
            chat.send(&format!("m{i}")).await.unwrap();
        }
        let seen = backend.seen.lock();
        let window = seen[3]["context"]["conversation_history"].as_array().unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0]["content"], "m2");
        assert_eq!(window[2]["content"], "m3");
    }

    #[tokio::test]
    async fn test_backend_error_becomes_system_turn() {
        let backend = Arc::new(EchoBackend {
            fail_with: Some("Agent not found".into()),
            ..Default::default()
        });
        let mut chat = ChatSession::new(backend, logged_in().await, agent("agent_aaaaaa"), 20);

        assert!(chat.send("hi").await.is_err());
        assert_eq!(chat.history().len(), 2);
        let last = chat.history().last().unwrap();
        assert_eq!(last.sender, Sender::System);
        assert_eq!(last.text, "Agent not found");
    }

    #[tokio::test]
    async fn test_not_logged_in_is_system_turn() {
        let session = Arc::new(SessionManager::new(MemoryGraph::new()));
        let mut chat = ChatSession::new(Arc::new(EchoBackend::default()), session, agent("agent_aaaaaa"), 20);

        let err = chat.send("hi").await.unwrap_err();
        assert!(matches!(err, DomainError::NotAuthenticated(_)));
        assert!(chat.history().last().unwrap().text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_switching_agent_resets_history() {
        let backend = Arc::new(EchoBackend::default());
        let mut chat = ChatSession::new(backend, logged_in().await, agent("agent_aaaaaa"), 20);
        chat.send("hello").await.unwrap();

        chat.switch_agent(agent("agent_aaaaaa"));
        assert_eq!(chat.history().len(), 2);
        chat.switch_agent(agent("agent_bbbbbb"));
        assert!(chat.history().is_empty());
    }
}
