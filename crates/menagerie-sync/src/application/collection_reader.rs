//! Collection Reader (Use Case)
//!
//! Lists the records a namespace links under a relation. Members are
//! enumerated once, then resolved concurrently, each under its own timeout.
//! A member that times out, fails, is tombstoned or does not decode is left
//! out; the read itself still succeeds. Results keep enumeration order.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use menagerie::{decode, DomainError, GraphStore, PublicKey, Record, RelationName, RelationSnapshot};

use super::SessionManager;

#[derive(Clone)]
pub struct CollectionReader {
    store: Arc<dyn GraphStore>,
    session: Arc<SessionManager>,
    item_timeout: Duration,
}

impl CollectionReader {
    pub fn new(store: Arc<dyn GraphStore>, session: Arc<SessionManager>, item_timeout: Duration) -> Self {
        Self {
            store,
            session,
            item_timeout,
        }
    }

    /// The caller's own records under the kind's default relation
    pub async fn read<R: Record>(&self) -> Result<Vec<R>, DomainError> {
        self.read_own(&R::default_relation()).await
    }

    pub async fn read_own<R: Record>(&self, relation: &RelationName) -> Result<Vec<R>, DomainError> {
        let identity = self.session.require()?;
        self.read_relation(identity.public_key(), relation).await
    }

    /// Records linked under `owner`'s namespace. Requires a session even when
    /// reading someone else's relation.
    pub async fn read_relation<R: Record>(
        &self,
        owner: &PublicKey,
        relation: &RelationName,
    ) -> Result<Vec<R>, DomainError> {
        if !self.store.is_connected() {
            return Err(DomainError::StoreUnavailable("store is offline".to_string()));
        }
        self.session.require()?;

        let members = match self.store.members(&owner.namespace(), relation).await? {
            RelationSnapshot::Absent => {
                tracing::debug!("{} has no {} relation yet", owner.namespace(), relation);
                return Ok(Vec::new());
            }
            RelationSnapshot::Members(members) => members,
        };
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let total = members.len();
        let resolved = join_all(members.iter().map(|soul| self.resolve::<R>(soul))).await;
        let records: Vec<R> = resolved.into_iter().flatten().collect();

        tracing::debug!(
            "Read {} of {} {} members under {}",
            records.len(),
            total,
            relation,
            owner.namespace()
        );
        Ok(records)
    }

    async fn resolve<R: Record>(&self, soul: &str) -> Option<R> {
        let node = match tokio::time::timeout(self.item_timeout, self.store.get(soul)).await {
            Ok(Ok(node)) => node,
            Ok(Err(e)) => {
                tracing::warn!("Skipping {} {}: {}", R::KIND, soul, e);
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    "Skipping {} {}: no data within {:?}",
                    R::KIND,
                    soul,
                    self.item_timeout
                );
                return None;
            }
        };

        match decode::<R>(soul, node) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                tracing::debug!("Skipping {} {}: deleted", R::KIND, soul);
                None
            }
            Err(e) => {
                tracing::warn!("Skipping {} {}: {}", R::KIND, soul, e);
                None
            }
        }
    }
}
