//! Identity Provider Port
//!
//! Account creation and authentication in the store's identity subsystem.
//! Leaving a session is local and has no store primitive.

use async_trait::async_trait;

use crate::domain::entities::{KeyPair, PublicKey};
use crate::domain::errors::DomainError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account; does not authenticate it
    async fn create(&self, alias: &str, password: &str) -> Result<PublicKey, DomainError>;

    /// Unlock the account's key material
    async fn authenticate(&self, alias: &str, password: &str) -> Result<KeyPair, DomainError>;
}
