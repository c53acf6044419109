//! Conversation - chat turns with an agent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    /// Locally generated notices, e.g. backend errors
    System,
}

/// Backend-facing role of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

impl From<Sender> for HistoryRole {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => HistoryRole::User,
            Sender::Agent | Sender::System => HistoryRole::Assistant,
        }
    }
}

/// One turn in a local conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text)
    }
}

/// History entry as the backend expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

/// The most recent `limit` turns, mapped to backend roles
pub fn history_window(turns: &[ConversationTurn], limit: usize) -> Vec<HistoryEntry> {
    let start = turns.len().saturating_sub(limit);
    turns[start..]
        .iter()
        .map(|turn| HistoryEntry {
            role: turn.sender.into(),
            content: turn.text.clone(),
        })
        .collect()
}
