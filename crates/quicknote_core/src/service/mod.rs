//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the remote API and the local fallback into user actions.
//! - Keep front ends decoupled from transport and storage details.

pub mod notes_controller;
