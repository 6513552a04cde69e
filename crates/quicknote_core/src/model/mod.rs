//! Domain model for notes.
//!
//! # Responsibility
//! - Define canonical data structures used by the controller and stores.
//! - Keep one note shape for remote, local and optimistic records.
//!
//! # Invariants
//! - Every displayed note is identified by a non-null `NoteId`.

pub mod note;
