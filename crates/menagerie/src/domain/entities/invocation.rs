//! Invocation payloads for the agent backend
//!
//! Top-level keys are camelCase and nested definition keys are snake_case,
//! matching what the backend reads.

use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::conversation::HistoryEntry;
use super::pet::Pet;
use crate::domain::value_objects::SignatureHex;

/// Backend endpoints reachable with a signed body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    InvokeAgent,
    CreatePetTask,
    ImprovePrompt,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::InvokeAgent => "/api/v1/agent/invoke",
            Endpoint::CreatePetTask => "/api/v1/agent/create_pet_task",
            Endpoint::ImprovePrompt => "/api/v1/llm/self_improve_prompt",
        }
    }
}

/// A body serialized exactly once, together with its signature.
/// `body` is the byte sequence that must go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub body: String,
    pub signature: SignatureHex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub system_prompt: String,
    pub role_name: String,
    pub model_type: String,
}

impl From<&Agent> for AgentDefinition {
    fn from(agent: &Agent) -> Self {
        Self {
            system_prompt: agent.system_prompt.clone(),
            role_name: agent.name.clone(),
            model_type: agent.model.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvocationContext {
    pub conversation_history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeAgentRequest {
    pub user_id: String,
    pub agent_id: String,
    pub agent_definition: AgentDefinition,
    pub message: String,
    pub context: InvocationContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeAgentResponse {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub system_prompt: String,
    pub model_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetDefinition {
    pub name: String,
    pub tool_snippet: PetToolDefinition,
}

impl From<&Pet> for PetDefinition {
    fn from(pet: &Pet) -> Self {
        Self {
            name: pet.name.clone(),
            tool_snippet: PetToolDefinition {
                kind: pet.tool_snippet.kind.clone(),
                system_prompt: pet.tool_snippet.system_prompt().to_string(),
                model_type: pet.tool_snippet.model_type().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetTaskRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_agent_id: Option<String>,
    pub pet_definition: PetDefinition,
    pub task_prompt_for_pet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetTaskResponse {
    pub pet_id: String,
    pub pet_response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovePromptRequest {
    pub user_id: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovePromptResponse {
    pub original_prompt: String,
    pub improved_prompt: String,
}
