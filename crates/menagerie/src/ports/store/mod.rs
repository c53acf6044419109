//! Store Ports
//!
//! The replicated graph and its identity subsystem.

mod graph_store;
mod identity_provider;

pub use graph_store::*;
pub use identity_provider::*;
