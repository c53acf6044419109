//! Application Layer (Use Cases)
//!
//! Orchestrates the graph store, the session and the agent backend.

mod chat_session;
mod collection_reader;
mod collection_view;
mod context;
mod prompt_service;
mod relational_writer;
mod request_signer;
mod session_manager;

pub use chat_session::ChatSession;
pub use collection_reader::CollectionReader;
pub use collection_view::{CollectionView, ViewState};
pub use context::SyncContext;
pub use prompt_service::PromptService;
pub use relational_writer::RelationalWriter;
pub use request_signer::RequestSigner;
pub use session_manager::{SessionManager, SessionState};
