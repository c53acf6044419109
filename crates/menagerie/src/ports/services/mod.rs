//! Service Ports
//!
//! Interfaces to remote services reached over the network.

mod agent_backend;

pub use agent_backend::*;
