//! Menagerie Sync Layer
//!
//! Application services over the replicated graph and the agent backend.
//!
//! - `adapters/`: in-memory replicated graph (with accounts) and the HTTP backend
//! - `application/`: session, collection reads, linked writes, request signing, chat
//! - `config`: environment driven settings
//! - `logging`: tracing subscriber setup
//!
//! # Usage
//!
//! ```rust,ignore
//! use menagerie_sync::{MemoryGraph, SyncConfig, SyncContext};
//!
//! let ctx = SyncContext::with_memory_graph(MemoryGraph::new(), SyncConfig::from_env()?);
//! ctx.session().login("alice", "secret").await?;
//! let pets: Vec<menagerie::Pet> = ctx.reader().read().await?;
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod logging;

pub use adapters::{error_display, HttpAgentBackend, MemoryGraph, NodeLookup, SIGNATURE_HEADER};
pub use application::{
    ChatSession, CollectionReader, CollectionView, PromptService, RelationalWriter, RequestSigner,
    SessionManager, SessionState, SyncContext, ViewState,
};
pub use config::SyncConfig;
