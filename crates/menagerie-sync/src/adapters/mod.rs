//! Adapters
//!
//! Implementations of the domain ports.

pub mod http_backend;
pub mod memory;

pub use http_backend::{error_display, HttpAgentBackend, SIGNATURE_HEADER};
pub use memory::{Account, MemoryGraph, NodeLookup, Replica};
