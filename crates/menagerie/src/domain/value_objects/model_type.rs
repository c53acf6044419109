//! ModelType - LLM model identifiers understood by the agent backend

use serde::{Deserialize, Serialize};

/// Model the backend should run an agent or pet with
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelType {
    #[default]
    #[serde(rename = "GPT_4O_MINI")]
    Gpt4oMini,
    #[serde(rename = "GPT_4O")]
    Gpt4o,
    #[serde(rename = "GPT_3_5_TURBO")]
    Gpt35Turbo,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [ModelType::Gpt4oMini, ModelType::Gpt4o, ModelType::Gpt35Turbo];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Gpt4oMini => "GPT_4O_MINI",
            ModelType::Gpt4o => "GPT_4O",
            ModelType::Gpt35Turbo => "GPT_3_5_TURBO",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GPT_4O_MINI" => Ok(ModelType::Gpt4oMini),
            "GPT_4O" => Ok(ModelType::Gpt4o),
            "GPT_3_5_TURBO" => Ok(ModelType::Gpt35Turbo),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}
