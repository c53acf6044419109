//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (graph store, identity subsystem, backend).
//!
//! Implementations of these traits live in `menagerie-sync`.

pub mod services;
pub mod store;

// Re-exports
pub use services::*;
pub use store::*;
