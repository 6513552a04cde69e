//! Core logic for QuickNote.
//! Notes CRUD against a remote API with a local fallback store.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod view;

pub use api::client::{ApiError, ApiResult, HttpNotesApi, NotesApi};
pub use config::{normalize_api_base, ClientConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteDraft, NoteId, NoteValidationError};
pub use service::notes_controller::{
    delete_prompt, ControllerError, FormMode, NotesController, SyncOutcome, ViewState,
};
pub use storage::fallback::{LocalFallback, FALLBACK_STORAGE_KEY};
pub use storage::kv::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
