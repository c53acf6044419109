//! Prompt Service (Use Case)
//!
//! One-shot signed calls: run a pet's tool on a task, and ask the backend to
//! rewrite a system prompt.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use menagerie::{
    AgentBackend, DomainError, Endpoint, Identity, ImprovePromptRequest, ImprovePromptResponse, Pet,
    PetTaskRequest, PetTaskResponse,
};

use super::{RequestSigner, SessionManager};

pub struct PromptService {
    backend: Arc<dyn AgentBackend>,
    session: Arc<SessionManager>,
}

impl PromptService {
    pub fn new(backend: Arc<dyn AgentBackend>, session: Arc<SessionManager>) -> Self {
        Self { backend, session }
    }

    /// Run `pet`'s tool on `task`, optionally on behalf of a parent agent
    pub async fn run_pet_task(
        &self,
        pet: &Pet,
        task: &str,
        parent_agent_id: Option<&str>,
    ) -> Result<PetTaskResponse, DomainError> {
        if task.trim().is_empty() {
            return Err(DomainError::validation("Task prompt is empty"));
        }
        let identity = self.session.require()?;
        let request = PetTaskRequest {
            user_id: identity.public_key().to_hex(),
            parent_agent_id: parent_agent_id.map(str::to_string),
            pet_definition: pet.into(),
            task_prompt_for_pet: task.to_string(),
        };

        let response: PetTaskResponse = self.call(&identity, Endpoint::CreatePetTask, &request).await?;
        tracing::info!("Pet {} completed task ({})", pet.id, response.pet_id);
        Ok(response)
    }

    pub async fn improve_prompt(&self, prompt: &str) -> Result<ImprovePromptResponse, DomainError> {
        if prompt.trim().is_empty() {
            return Err(DomainError::validation("Prompt is empty"));
        }
        let identity = self.session.require()?;
        let request = ImprovePromptRequest {
            user_id: identity.public_key().to_hex(),
            prompt: prompt.to_string(),
        };
        self.call(&identity, Endpoint::ImprovePrompt, &request).await
    }

    async fn call<Req, Resp>(
        &self,
        identity: &Identity,
        endpoint: Endpoint,
        request: &Req,
    ) -> Result<Resp, DomainError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let signed = RequestSigner::sign_as(Some(identity), request)?;
        let value = self.backend.post_signed(endpoint, &signed).await?;
        serde_json::from_value(value)
            .map_err(|e| DomainError::Backend(format!("Unexpected response from {}: {e}", endpoint.path())))
    }
}
