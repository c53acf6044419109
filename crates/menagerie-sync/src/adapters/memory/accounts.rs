//! Account subsystem of the in-memory graph
//!
//! Accounts replicate like any other write. The secret key sits in the replica
//! next to a salted SHA-256 digest of the password; the replica file is as
//! sensitive as the keys it holds.

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};

use menagerie::{DomainError, IdentityProvider, KeyPair, PublicKey, RawSigner};

use super::{Account, MemoryGraph};

const SALT_LEN: usize = 16;

fn password_digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn wrong_credentials() -> DomainError {
    DomainError::Authentication("Wrong user or password.".to_string())
}

#[async_trait]
impl IdentityProvider for MemoryGraph {
    async fn create(&self, alias: &str, password: &str) -> Result<PublicKey, DomainError> {
        self.ensure_connected()?;

        let key_pair = KeyPair::generate();
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let account = Account {
            public_key: key_pair.public_key().to_namespace_form(),
            salt: hex::encode(salt),
            digest: password_digest(&salt, password),
            secret: key_pair.secret_hex(),
        };

        if !self.claim_account(alias, account) {
            return Err(DomainError::Authentication("User already created!".to_string()));
        }
        tracing::info!("Created account {} ({})", alias, key_pair.public_key());
        Ok(key_pair.public_key().clone())
    }

    async fn authenticate(&self, alias: &str, password: &str) -> Result<KeyPair, DomainError> {
        self.ensure_connected()?;
        let account = self
            .replica
            .read()
            .accounts
            .get(alias)
            .cloned()
            .ok_or_else(wrong_credentials)?;

        let salt = hex::decode(&account.salt)
            .map_err(|e| DomainError::Authentication(format!("corrupt account salt: {e}")))?;
        if password_digest(&salt, password) != account.digest {
            return Err(wrong_credentials());
        }

        let key_pair = KeyPair::from_secret_hex(&account.secret).map_err(DomainError::Authentication)?;
        if key_pair.public_key().to_namespace_form() != account.public_key {
            return Err(DomainError::Authentication(
                "stored key material does not match the account".to_string(),
            ));
        }
        Ok(key_pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_authenticate() {
        let graph = MemoryGraph::new();
        let public = graph.create("alice", "hunter2").await.unwrap();
        let pair = graph.authenticate("alice", "hunter2").await.unwrap();
        assert_eq!(pair.public_key(), &public);
    }

    #[tokio::test]
    async fn test_duplicate_alias_rejected() {
        let graph = MemoryGraph::new();
        graph.create("alice", "a").await.unwrap();
        let err = graph.create("alice", "b").await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: User already created!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_alias_claimed_on_two_peers_settles_on_one_account() {
        let left = MemoryGraph::new();
        let right = MemoryGraph::new();
        MemoryGraph::connect_peers(&left, &right, std::time::Duration::from_millis(100));

        left.create("alice", "left").await.unwrap();
        right.create("alice", "right").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(left.snapshot().accounts["alice"], right.snapshot().accounts["alice"]);
        let winners = [
            left.authenticate("alice", "left").await.is_ok(),
            left.authenticate("alice", "right").await.is_ok(),
        ];
        assert_eq!(winners.iter().filter(|won| **won).count(), 1);
        assert!(matches!(left.create("alice", "again").await, Err(DomainError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let graph = MemoryGraph::new();
        graph.create("alice", "right").await.unwrap();
        let wrong = graph.authenticate("alice", "wrong").await.unwrap_err();
        let unknown = graph.authenticate("bob", "right").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_account_not_stored_in_plain_password() {
        let graph = MemoryGraph::new();
        graph.create("alice", "hunter2").await.unwrap();
        let account = graph.snapshot().accounts["alice"].clone();
        assert!(!account.digest.contains("hunter2"));
        assert_eq!(account.digest.len(), 64);
    }
}
