//! Offline persistence layer.
//!
//! # Responsibility
//! - Define the key/value slot contract and its SQLite/in-memory backends.
//! - Own the fallback note list used while the remote API is unreachable.

pub mod fallback;
pub mod kv;
