//! Domain Services
//!
//! Stateless logic over entities: record (de)serialization and id generation.

pub mod codec;

pub use codec::{decode, encode, generate_id, is_tombstone, Node};
