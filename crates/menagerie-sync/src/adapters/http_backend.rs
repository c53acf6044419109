//! HTTP Agent Backend
//!
//! Posts signed request bodies to the agent-invocation service using reqwest.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use menagerie::{AgentBackend, DomainError, Endpoint, SignedPayload};

use crate::config::SyncConfig;

/// Header carrying the hex signature of the request body
pub const SIGNATURE_HEADER: &str = "X-GUN-Signature";

/// HTTP implementation of AgentBackend
pub struct HttpAgentBackend {
    client: Client,
    base_url: String,
}

impl HttpAgentBackend {
    pub fn new(config: &SyncConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("menagerie/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        Self::new(
            &SyncConfig::default()
                .with_backend_url(base_url)
                .with_request_timeout(timeout),
        )
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

/// Reduce a failed response to what the user sees: JSON `error`, then JSON
/// `details`, then a generic status line
pub fn error_display(status: u16, body: &str) -> String {
    let fallback = format!("API Error: {}", status);
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback;
    };
    ["error", "details"]
        .iter()
        .find_map(|key| json.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or(fallback)
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn post_signed(
        &self,
        endpoint: Endpoint,
        payload: &SignedPayload,
    ) -> Result<serde_json::Value, DomainError> {
        let url = self.url(endpoint);
        tracing::debug!("POST {} ({} bytes)", url, payload.body.len());

        // The body goes out as the exact signed string, never re-serialized
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, payload.signature.as_str())
            .body(payload.body.clone())
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("Failed to reach agent backend: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| DomainError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::warn!("Backend error ({}): {}", status, text);
            return Err(DomainError::Backend(error_display(status.as_u16(), &text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| DomainError::Backend(format!("Failed to parse response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_wins() {
        let body = r#"{"error":"Signature verification failed","details":"x"}"#;
        assert_eq!(error_display(401, body), "Signature verification failed");
    }

    #[test]
    fn test_details_used_when_no_error() {
        assert_eq!(error_display(500, r#"{"details":"boom"}"#), "boom");
    }

    #[test]
    fn test_plain_text_falls_back_to_status() {
        assert_eq!(error_display(502, "Bad Gateway"), "API Error: 502");
        assert_eq!(error_display(500, r#"{"status":"error"}"#), "API Error: 500");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpAgentBackend::with_timeout("http://localhost:5001/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.url(Endpoint::InvokeAgent),
            "http://localhost:5001/api/v1/agent/invoke"
        );
    }
}
