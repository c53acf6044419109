//! Pet - a tool snippet with a sprite, kept in the owner's toolbox

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::record::{require_name, Record, RecordDraft, Stamp};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ModelType, RelationName};

pub const DEFAULT_TOOL_TYPE: &str = "prompt_llm";

/// Sprite used when a stored pet has none, or a non-object value
pub fn fallback_sprite_params() -> Value {
    json!({ "shape": "cube", "color": "#cccccc", "size": 0.5 })
}

/// Executable part of a pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSnippet {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Value,
}

impl Default for ToolSnippet {
    fn default() -> Self {
        Self {
            kind: DEFAULT_TOOL_TYPE.to_string(),
            config: json!({ "system_prompt": "", "model_type": ModelType::default().as_str() }),
        }
    }
}

impl ToolSnippet {
    pub fn system_prompt(&self) -> &str {
        self.config
            .get("system_prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn model_type(&self) -> &str {
        self.config
            .get("model_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Pet record as stored in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tool_snippet: ToolSnippet,
    pub sprite_params: Value,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Pet {
    const KIND: &'static str = "pet";
    const ID_PREFIX: &'static str = "pet";

    fn default_relation() -> RelationName {
        RelationName::toolbox()
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn fill_defaults(node: &mut Map<String, Value>) {
        if !node.get("spriteParams").is_some_and(Value::is_object) {
            node.insert("spriteParams".to_string(), fallback_sprite_params());
        }
    }
}

/// Pet creation or edit form
///
/// Tool config and sprite params arrive as JSON text and are checked before any write.
#[derive(Debug, Clone)]
pub struct PetDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub tool_type: String,
    pub tool_config: String,
    pub sprite_params: String,
    /// Owner of the record being edited
    pub owner: Option<String>,
}

impl Default for PetDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            tool_type: DEFAULT_TOOL_TYPE.to_string(),
            tool_config: "{\n  \"system_prompt\": \"\",\n  \"model_type\": \"GPT_4O_MINI\"\n}"
                .to_string(),
            sprite_params: "{\n  \"color\": \"blue\",\n  \"shape\": \"circle\"\n}".to_string(),
            owner: None,
        }
    }
}

impl PetDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Start an edit of an existing pet, keeping its id
    pub fn editing(pet: &Pet) -> Self {
        Self {
            id: Some(pet.id.clone()),
            name: pet.name.clone(),
            description: pet.description.clone(),
            tool_type: pet.tool_snippet.kind.clone(),
            tool_config: serde_json::to_string_pretty(&pet.tool_snippet.config)
                .unwrap_or_else(|_| "{}".to_string()),
            sprite_params: serde_json::to_string_pretty(&pet.sprite_params)
                .unwrap_or_else(|_| "{}".to_string()),
            owner: Some(pet.owner.clone()).filter(|owner| !owner.is_empty()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tool(mut self, tool_type: impl Into<String>, config: impl Into<String>) -> Self {
        self.tool_type = tool_type.into();
        self.tool_config = config.into();
        self
    }

    pub fn with_sprite_params(mut self, sprite_params: impl Into<String>) -> Self {
        self.sprite_params = sprite_params.into();
        self
    }
}

fn parse_object(field: &str, text: &str) -> Result<Value, DomainError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(DomainError::validation(format!("{} must be a JSON object", field))),
        Err(_) => Err(DomainError::validation(format!("{} is not valid JSON", field))),
    }
}

impl RecordDraft for PetDraft {
    type Record = Pet;

    fn existing_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn existing_owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_name("Pet", &self.name)?;
        if self.tool_type.trim().is_empty() {
            return Err(DomainError::validation("Tool snippet type is required"));
        }
        parse_object("Tool snippet config", &self.tool_config)?;
        parse_object("Sprite parameters", &self.sprite_params)?;
        Ok(())
    }

    fn into_record(self, id: String, owner: String, stamp: Stamp) -> Result<Pet, DomainError> {
        require_name("Pet", &self.name)?;
        let config = parse_object("Tool snippet config", &self.tool_config)?;
        let sprite_params = parse_object("Sprite parameters", &self.sprite_params)?;
        Ok(Pet {
            id,
            name: self.name,
            description: self.description,
            tool_snippet: ToolSnippet {
                kind: self.tool_type,
                config,
            },
            sprite_params,
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
    fn test_malformed_config_rejected() {
        let draft = PetDraft::new("Rex").with_tool("prompt_llm", "{not json");
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Tool snippet config is not valid JSON");
    }

    #[test]
    fn test_sprite_params_must_be_object() {
        let draft = PetDraft::new("Rex").with_sprite_params("[1, 2]");
        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_default_draft_is_valid() {
        let pet = PetDraft::new("Rex")
            .into_record("pet_Ab12Cd".into(), "owner".into(), Stamp::Created(Utc::now()))
            .unwrap();
        assert_eq!(pet.tool_snippet.kind, "prompt_llm");
        assert_eq!(pet.tool_snippet.model_type(), "GPT_4O_MINI");
        assert_eq!(pet.sprite_params["shape"], "circle");
    }

    #[test]
    fn test_fill_defaults_replaces_non_object_sprite() {
        let mut node = Map::new();
        node.insert("spriteParams".into(), json!("cube"));
        Pet::fill_defaults(&mut node);
        assert_eq!(node["spriteParams"], fallback_sprite_params());
    }

    #[test]
    fn test_editing_round_trips_config() {
        let pet = PetDraft::new("Rex")
            .with_tool("prompt_llm", r#"{"system_prompt":"fetch","model_type":"GPT_4O"}"#)
            .into_record("pet_Ab12Cd".into(), "owner".into(), Stamp::Created(Utc::now()))
            .unwrap();
        let edited = PetDraft::editing(&pet)
            .into_record(pet.id.clone(), "owner".into(), Stamp::Updated(Utc::now()))
            .unwrap();
        assert_eq!(edited.tool_snippet, pet.tool_snippet);
        assert!(edited.created_at.is_none());
        assert!(edited.updated_at.is_some());
    }
}
