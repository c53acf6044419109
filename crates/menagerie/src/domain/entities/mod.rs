//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Agent: chat persona stored in the `agents` relation
//! - Pet: tool-snippet helper stored in the `toolbox` relation
//! - Identity: alias plus secp256k1 key material
//! - Conversation: chat turns and the history window sent to the backend
//! - Invocation: signed request/response payloads for the agent backend

mod agent;
mod conversation;
mod identity;
mod invocation;
mod pet;
mod record;

pub use agent::*;
pub use conversation::*;
pub use identity::*;
pub use invocation::*;
pub use pet::*;
pub use record::*;
