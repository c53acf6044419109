//! Agent - chat persona owned by an identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{require_name, Record, RecordDraft, Stamp};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ModelType, RelationName};

/// Agent record as stored in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub system_prompt: String,
    /// Namespace-form public key of the creating identity
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Agent {
    const KIND: &'static str = "agent";
    const ID_PREFIX: &'static str = "agent";

    fn default_relation() -> RelationName {
        RelationName::agents()
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Agent creation or edit form
///
/// `model` is kept as stored text so an edit never rewrites a model this
/// client does not know.
#[derive(Debug, Clone)]
pub struct AgentDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub model: String,
    pub system_prompt: String,
    /// Owner of the record being edited
    pub owner: Option<String>,
}

impl Default for AgentDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            model: ModelType::default().to_string(),
            system_prompt: String::new(),
            owner: None,
        }
    }
}

impl AgentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Start an edit of an existing agent, keeping its id, owner and model
    pub fn editing(agent: &Agent) -> Self {
        Self {
            id: Some(agent.id.clone()),
            name: agent.name.clone(),
            description: agent.description.clone(),
            model: agent.model.clone(),
            system_prompt: agent.system_prompt.clone(),
            owner: Some(agent.owner.clone()).filter(|owner| !owner.is_empty()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_model(mut self, model: ModelType) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

impl RecordDraft for AgentDraft {
    type Record = Agent;

    fn existing_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn existing_owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_name("Agent", &self.name)
    }

    fn into_record(self, id: String, owner: String, stamp: Stamp) -> Result<Agent, DomainError> {
        self.validate()?;
        Ok(Agent {
            id,
            name: self.name,
            description: self.description,
            model: self.model,
            system_prompt: self.system_prompt,
            owner,
            created_at: stamp.created_at(),
            updated_at: stamp.updated_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let err = AgentDraft::new("   ").validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let agent = AgentDraft::new("Scout")
            .with_system_prompt("Be brief.")
            .into_record("agent_abc123".into(), "owner".into(), Stamp::Created(Utc::now()))
            .unwrap();
        let json = serde_json::to_value(&agent).unwrap();

        assert_eq!(json["systemPrompt"], "Be brief.");
        assert_eq!(json["model"], "GPT_4O_MINI");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_editing_keeps_id() {
        let agent = AgentDraft::new("Scout")
            .into_record("agent_abc123".into(), "owner".into(), Stamp::Created(Utc::now()))
            .unwrap();
        let draft = AgentDraft::editing(&agent).with_description("updated");
        assert_eq!(draft.existing_id(), Some("agent_abc123"));
        assert_eq!(draft.existing_owner(), Some("owner"));
    }

    #[test]
    fn test_editing_keeps_unknown_model() {
        let mut agent = AgentDraft::new("Scout")
            .into_record("agent_abc123".into(), "owner".into(), Stamp::Created(Utc::now()))
            .unwrap();
        agent.model = "CLAUDE_3_OPUS".to_string();

        let edited = AgentDraft::editing(&agent)
            .with_description("updated")
            .into_record(agent.id.clone(), "owner".into(), Stamp::Updated(Utc::now()))
            .unwrap();
        assert_eq!(edited.model, "CLAUDE_3_OPUS");
    }
}
