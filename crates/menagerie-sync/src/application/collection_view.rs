//! Collection View
//!
//! Holds the latest list for one relation and publishes it over a watch
//! channel. Each refresh takes a generation number; a result is applied only if
//! no newer refresh started meanwhile and the view is still open.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

use menagerie::{PublicKey, Record, RelationName};

use super::CollectionReader;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<R> {
    Idle,
    Loading,
    Ready(Vec<R>),
    Failed(String),
}

pub struct CollectionView<R: Record> {
    reader: CollectionReader,
    owner: Option<PublicKey>,
    relation: RelationName,
    generation: AtomicU64,
    closed: AtomicBool,
    state: watch::Sender<ViewState<R>>,
}

impl<R: Record> CollectionView<R> {
    /// View of the signed-in identity's own records
    pub fn new(reader: CollectionReader) -> Self {
        Self::build(reader, None, R::default_relation())
    }

    /// View of another identity's relation
    pub fn for_owner(reader: CollectionReader, owner: PublicKey, relation: RelationName) -> Self {
        Self::build(reader, Some(owner), relation)
    }

    fn build(reader: CollectionReader, owner: Option<PublicKey>, relation: RelationName) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            reader,
            owner,
            relation,
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> ViewState<R> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<R>> {
        self.state.subscribe()
    }

    /// Re-read the relation. Returns `false` when the result was discarded
    /// because a newer refresh started or the view was closed.
    pub async fn refresh(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(ViewState::Loading);

        let result = match &self.owner {
            Some(owner) => self.reader.read_relation::<R>(owner, &self.relation).await,
            None => self.reader.read_own::<R>(&self.relation).await,
        };

        if self.closed.load(Ordering::SeqCst) || self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale {} read (generation {})", self.relation, generation);
            return false;
        }

        self.state.send_replace(match result {
            Ok(records) => ViewState::Ready(records),
            Err(e) => ViewState::Failed(e.to_string()),
        });
        true
    }

    /// Stop applying results; in-flight refreshes are discarded
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
