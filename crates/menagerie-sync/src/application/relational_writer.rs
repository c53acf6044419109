//! Relational Writer (Use Case)
//!
//! Saves a record as a node and links it into the owner's relation.
//! The node put is optimistic and its ack is not awaited; the link ack decides
//! whether the save succeeded. Delete unlinks, then tombstones the node.

use std::sync::Arc;

use chrono::Utc;

use menagerie::{
    encode, generate_id, DomainError, GraphStore, Identity, Record, RecordDraft, RelationName, Stamp,
};

use super::SessionManager;

#[derive(Clone)]
pub struct RelationalWriter {
    store: Arc<dyn GraphStore>,
    session: Arc<SessionManager>,
}

impl RelationalWriter {
    pub fn new(store: Arc<dyn GraphStore>, session: Arc<SessionManager>) -> Self {
        Self { store, session }
    }

    /// Save under the record kind's default relation
    pub async fn save<D: RecordDraft>(&self, draft: D) -> Result<D::Record, DomainError> {
        self.save_in(&<D::Record as Record>::default_relation(), draft).await
    }

    pub async fn save_in<D: RecordDraft>(
        &self,
        relation: &RelationName,
        draft: D,
    ) -> Result<D::Record, DomainError> {
        // Validation failures never reach the store
        draft.validate()?;
        let identity = self.session.require()?;
        self.write(&identity, relation, draft).await
    }

    /// Save on behalf of an explicit identity
    pub async fn save_as<D: RecordDraft>(
        &self,
        owner: &Identity,
        relation: &RelationName,
        draft: D,
    ) -> Result<D::Record, DomainError> {
        draft.validate()?;
        self.write(owner, relation, draft).await
    }

    async fn write<D: RecordDraft>(
        &self,
        owner: &Identity,
        relation: &RelationName,
        draft: D,
    ) -> Result<D::Record, DomainError> {
        let now = Utc::now();
        let (id, stamp) = match draft.existing_id() {
            Some(id) => (id.to_string(), Stamp::Updated(now)),
            None => (generate_id(<D::Record as Record>::ID_PREFIX), Stamp::Created(now)),
        };

        let editor = owner.public_key().to_namespace_form();
        let record_owner = match stamp {
            Stamp::Updated(_) => draft.existing_owner().map(str::to_string).unwrap_or(editor),
            Stamp::Created(_) => editor,
        };

        let record = draft.into_record(id.clone(), record_owner, stamp)?;
        let mut node = encode(&record)?;
        if matches!(stamp, Stamp::Updated(_)) {
            // Owner is set once at creation; the merge keeps the stored value
            node.remove("owner");
        }

        let _ = self.store.put(&id, Some(node));
        self.store
            .link(&owner.namespace(), relation, &id)
            .wait()
            .await
            .map_err(|e| {
                tracing::warn!("Link of {} into {} failed: {}", id, relation, e);
                DomainError::Ack(e)
            })?;

        tracing::info!(
            "Saved {} {} under {}",
            <D::Record as Record>::KIND,
            id,
            relation
        );
        Ok(record)
    }

    /// Delete under the record kind's default relation
    pub async fn delete<R: Record>(&self, id: &str) -> Result<(), DomainError> {
        self.delete_in(&R::default_relation(), id).await
    }

    /// Unlink then tombstone. The tombstone is written even if the unlink is
    /// rejected; both outcomes are reported.
    pub async fn delete_in(&self, relation: &RelationName, id: &str) -> Result<(), DomainError> {
        let identity = self.session.require()?;

        let unlink = self
            .store
            .unlink(&identity.namespace(), relation, id)
            .wait()
            .await
            .err();
        let tombstone = self.store.put(id, None).wait().await.err();

        if unlink.is_none() && tombstone.is_none() {
            tracing::info!("Deleted {} from {}", id, relation);
            return Ok(());
        }
        Err(DomainError::Delete {
            id: id.to_string(),
            unlink,
            tombstone,
        })
    }
}
