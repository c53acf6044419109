//! Value Objects
//!
//! Immutable value types used across the domain.

mod model_type;
mod relation;
mod signature;

pub use model_type::*;
pub use relation::*;
pub use signature::*;
