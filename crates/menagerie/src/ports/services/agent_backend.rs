//! Agent Backend Port
//!
//! Transport to the agent-invocation service. Requests are already signed;
//! implementations must send `SignedPayload::body` byte for byte.

use async_trait::async_trait;

use crate::domain::entities::{Endpoint, SignedPayload};
use crate::domain::errors::DomainError;

#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// POST a signed body. Returns the success response as JSON; a non-2xx
    /// response becomes `DomainError::Backend` with a display string.
    async fn post_signed(
        &self,
        endpoint: Endpoint,
        payload: &SignedPayload,
    ) -> Result<serde_json::Value, DomainError>;
}
