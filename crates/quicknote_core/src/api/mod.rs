//! Remote API boundary.
//!
//! # Responsibility
//! - Define the `NotesApi` seam used by the controller.
//! - Provide the blocking HTTP implementation.

pub mod client;
