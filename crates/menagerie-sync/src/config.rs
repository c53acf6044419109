//! Sync layer configuration

use std::time::Duration;

use menagerie::DomainError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5001";

/// Configuration for readers, chat sessions and the backend client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the agent-invocation backend
    pub backend_url: String,
    /// Upper bound on resolving a single relation member
    pub read_timeout: Duration,
    /// Conversation turns forwarded per invocation
    pub history_limit: usize,
    /// Timeout for one backend request
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            read_timeout: Duration::from_millis(500),
            history_limit: 20,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `MENAGERIE_*` variables (a `.env` file is honored)
    pub fn from_env() -> Result<Self, DomainError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let mut config = Self::default();

        if let Some(url) = lookup("MENAGERIE_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(ms) = lookup("MENAGERIE_READ_TIMEOUT_MS") {
            config.read_timeout = Duration::from_millis(parse_number("MENAGERIE_READ_TIMEOUT_MS", &ms)?);
        }
        if let Some(limit) = lookup("MENAGERIE_HISTORY_LIMIT") {
            config.history_limit = parse_number("MENAGERIE_HISTORY_LIMIT", &limit)? as usize;
        }
        if let Some(secs) = lookup("MENAGERIE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("MENAGERIE_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::Config(format!("{} must be a non-negative integer, got {:?}", key, value)))
}
