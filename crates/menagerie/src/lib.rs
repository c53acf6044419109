//! Menagerie Domain Library
//!
//! Core domain types and interfaces for a client that keeps agents and pets in
//! a peer-replicated graph and talks to a signature-checking agent backend.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Agent, Pet, Identity, conversation turns, invocation payloads
//!   - `value_objects/`: RelationName, Namespace, ModelType, SignatureHex
//!   - `services/`: record codec and id generation
//!   - `errors/`: Domain error taxonomy
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `store/`: replicated graph and identity subsystem
//!   - `services/`: agent backend transport
//!
//! # Usage
//!
//! ```rust,ignore
//! use menagerie::domain::{Pet, PetDraft};
//! use menagerie::ports::GraphStore;
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    decode, encode, fallback_sprite_params, generate_id, history_window, is_tombstone, AckError,
    AckOperation, Agent, AgentDefinition, AgentDraft, ConversationTurn, DomainError, Endpoint,
    HistoryEntry, HistoryRole, Identity, ImprovePromptRequest, ImprovePromptResponse,
    InvocationContext, InvokeAgentRequest, InvokeAgentResponse, KeyPair, ModelType, Namespace,
    Node, Pet, PetDefinition, PetDraft, PetTaskRequest, PetTaskResponse, PetToolDefinition,
    PublicKey, RawSignature, RawSigner, Record, RecordDraft, RelationName, Sender, SignatureHex,
    SignedPayload, SigningError, SigningStage, Stamp, ToolSnippet, RAW_SIGNATURE_LEN,
};
pub use ports::{
    Acknowledger, AgentBackend, GraphStore, IdentityProvider, PendingAck, RelationSnapshot,
};
