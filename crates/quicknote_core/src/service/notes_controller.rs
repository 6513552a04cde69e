//! Notes controller: optimistic updates with local fallback.
//!
//! # Responsibility
//! - Own the displayed note list, selection and status messages.
//! - Apply optimistic changes, then reconcile with the remote API result.
//! - Fall back to the local store whenever the remote API fails.
//!
//! # Invariants
//! - After a successful remote call the local store mirrors the list.
//! - A failed create never leaves its temporary note behind.
//! - A failed update reverts to the prior note before applying the local copy.
//! - A failed delete is not reverted; the note is removed locally instead.
//! - Note contents never appear in log events.

use crate::api::client::{ApiError, HttpNotesApi, NotesApi};
use crate::config::ClientConfig;
use crate::model::note::{
    generate_temp_id, normalize_remote_notes, note_from_response, Note, NoteDraft, NoteId,
};
use crate::storage::fallback::LocalFallback;
use crate::storage::kv::{KeyValueStore, SqliteKeyValueStore, StoreError};
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BANNER_BACKEND_UNAVAILABLE: &str = "Backend unavailable.";
const BANNER_SAVED_LOCALLY: &str = "Saved locally.";
const LOAD_ERROR_EMPTY: &str = "Could not reach backend. You can still use notes locally.";
const LOAD_ERROR_WITH_NOTES: &str = "Could not reach backend. Showing locally saved notes.";
const INLINE_CREATED_LOCALLY: &str = "Saved locally because backend could not be reached.";
const INLINE_UPDATED_LOCALLY: &str = "Updated locally because backend could not be reached.";
const INLINE_DELETED_LOCALLY: &str = "Deleted locally because backend could not be reached.";
const INLINE_UPDATE_FAILED: &str = "Could not update note.";

/// Controller-level failures.
#[derive(Debug)]
pub enum ControllerError {
    /// No displayed note carries the requested id.
    NoteNotFound(NoteId),
    /// Remote client could not be constructed.
    Api(ApiError),
    /// Fallback store could not be opened.
    Store(StoreError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Api(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoteNotFound(_) => None,
            Self::Api(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ApiError> for ControllerError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Which submission the form performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Add,
    Edit,
}

/// Where a user action ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote API accepted the change.
    Synced,
    /// The remote API failed; the change lives in the local store.
    Local,
    /// Neither store could apply the change.
    Rejected,
    /// The user declined the confirmation.
    Cancelled,
    /// Nothing to do (for example an update without a selection).
    Skipped,
}

/// Everything a front end needs to render the notes screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub notes: Vec<Note>,
    pub selected: Option<Note>,
    pub mode: FormMode,
    pub is_offline: bool,
    pub banner_message: Option<String>,
    pub loading: bool,
    pub load_error: Option<String>,
    pub saving: bool,
    pub inline_error: Option<String>,
    pub last_server_sync: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            selected: None,
            mode: FormMode::Add,
            is_offline: false,
            banner_message: None,
            loading: true,
            load_error: None,
            saving: false,
            inline_error: None,
            last_server_sync: false,
        }
    }
}

impl ViewState {
    /// True once loading finished with nothing to show.
    pub fn is_empty(&self) -> bool {
        !self.loading && self.notes.is_empty()
    }

    /// Short status shown next to the list header.
    pub fn sync_label(&self) -> &'static str {
        if self.is_offline {
            "Local"
        } else if self.last_server_sync {
            "Synced"
        } else {
            "Not synced"
        }
    }

    /// Id of the selected note, if any.
    pub fn selected_id(&self) -> Option<&NoteId> {
        self.selected.as_ref().map(|note| &note.id)
    }

    /// Finds a displayed note by id.
    pub fn find(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id.same_as(id))
    }
}

/// Confirmation prompt shown before deleting `note`.
pub fn delete_prompt(note: &Note) -> String {
    format!("Delete \"{}\"? This cannot be undone.", note.title)
}

/// Session controller over a remote API and a local fallback store.
pub struct NotesController<A: NotesApi, S: KeyValueStore> {
    api: A,
    fallback: LocalFallback<S>,
    state: ViewState,
}

impl NotesController<HttpNotesApi, SqliteKeyValueStore> {
    /// Builds the production controller: HTTP API plus SQLite fallback.
    ///
    /// # Errors
    /// - Returns `Api` when the HTTP client cannot be built.
    /// - Returns `Store` when the fallback database cannot be opened.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ControllerError> {
        let api = HttpNotesApi::new(config)?;
        let store = SqliteKeyValueStore::open(config.fallback_db_path())?;
        info!(
            "event=controller_init module=controller status=ok remote_configured={}",
            config.api_base.is_some()
        );
        Ok(Self::new(api, LocalFallback::new(store)))
    }
}

impl<A: NotesApi, S: KeyValueStore> NotesController<A, S> {
    /// Creates a controller in the initial "loading" state.
    pub fn new(api: A, fallback: LocalFallback<S>) -> Self {
        Self {
            api,
            fallback,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn fallback(&self) -> &LocalFallback<S> {
        &self.fallback
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Loads the list from the remote API, or from the local store on failure.
    pub fn refresh(&mut self) -> SyncOutcome {
        self.state.loading = true;
        self.state.load_error = None;

        let outcome = match self.api.list_notes() {
            Ok(payload) => {
                let notes = normalize_remote_notes(&payload);
                self.fallback.replace_notes(&notes);
                info!(
                    "event=notes_load module=controller status=ok source=remote count={}",
                    notes.len()
                );
                self.state.notes = notes;
                self.mark_synced();
                SyncOutcome::Synced
            }
            Err(err) => {
                let notes = self.fallback.load_notes();
                warn!(
                    "event=notes_load module=controller status=fallback source=local count={} error_code={}",
                    notes.len(),
                    err.code()
                );
                self.state.load_error = Some(
                    if notes.is_empty() {
                        LOAD_ERROR_EMPTY
                    } else {
                        LOAD_ERROR_WITH_NOTES
                    }
                    .to_string(),
                );
                self.state.notes = notes;
                self.state.is_offline = true;
                self.state.banner_message = Some(BANNER_BACKEND_UNAVAILABLE.to_string());
                self.state.last_server_sync = false;
                SyncOutcome::Local
            }
        };

        self.state.loading = false;
        outcome
    }

    /// Switches the form to "add" and clears the selection.
    pub fn start_add(&mut self) {
        self.state.selected = None;
        self.state.mode = FormMode::Add;
        self.state.inline_error = None;
    }

    /// Selects a displayed note for editing.
    ///
    /// # Errors
    /// - Returns `NoteNotFound` when no displayed note carries `id`.
    pub fn start_edit(&mut self, id: &NoteId) -> Result<(), ControllerError> {
        let note = self
            .state
            .find(id)
            .cloned()
            .ok_or_else(|| ControllerError::NoteNotFound(id.clone()))?;
        self.state.selected = Some(note);
        self.state.mode = FormMode::Edit;
        self.state.inline_error = None;
        Ok(())
    }

    /// Creates a note, optimistically shown under a temporary id.
    pub fn create(&mut self, draft: &NoteDraft) -> SyncOutcome {
        self.state.saving = true;
        self.state.inline_error = None;

        let temp_id = generate_temp_id();
        self.state.notes.insert(
            0,
            Note {
                id: temp_id.clone(),
                title: draft.title().to_string(),
                content: draft.content().to_string(),
            },
        );

        let created = self
            .api
            .create_note(draft)
            .map(|body| note_from_response(&body, None));

        let outcome = match created {
            Ok(Some(created)) => {
                self.remove_note(&temp_id);
                self.state.notes.insert(0, created);
                self.fallback.replace_notes(&self.state.notes);
                self.mark_synced();
                info!("event=note_create module=controller status=ok source=remote");
                SyncOutcome::Synced
            }
            failed => {
                log_remote_failure("note_create", failed.err());
                self.remove_note(&temp_id);
                let local = self.fallback.create_note(draft);
                self.state.notes.insert(0, local);
                self.mark_local(INLINE_CREATED_LOCALLY);
                SyncOutcome::Local
            }
        };

        self.state.saving = false;
        outcome
    }

    /// Updates the selected note, optimistically applying the draft first.
    pub fn update(&mut self, draft: &NoteDraft) -> SyncOutcome {
        let Some(prior) = self.state.selected.clone() else {
            return SyncOutcome::Skipped;
        };
        self.state.saving = true;
        self.state.inline_error = None;

        let optimistic = prior.with_draft(draft);
        self.replace_note(&prior.id, optimistic.clone());
        self.state.selected = Some(optimistic.clone());

        // Any non-null body is an acknowledgement; only objects replace the draft.
        let updated = self.api.update_note(&prior.id, draft).map(|body| match body {
            Value::Null => None,
            Value::Object(_) => note_from_response(&body, Some(&prior.id)),
            _ => Some(optimistic),
        });

        let outcome = match updated {
            Ok(Some(updated)) => {
                self.replace_note(&prior.id, updated.clone());
                self.fallback.replace_notes(&self.state.notes);
                self.state.selected = Some(updated);
                self.mark_synced();
                info!("event=note_update module=controller status=ok source=remote");
                SyncOutcome::Synced
            }
            failed => {
                log_remote_failure("note_update", failed.err());
                self.replace_note(&prior.id, prior.clone());
                let outcome = match self.fallback.update_note(&prior.id, draft) {
                    Some(local) => {
                        self.replace_note(&prior.id, local.clone());
                        self.state.selected = Some(local);
                        self.mark_local(INLINE_UPDATED_LOCALLY);
                        SyncOutcome::Local
                    }
                    None => {
                        warn!("event=note_update module=controller status=error error_code=not_in_fallback");
                        self.state.selected = Some(prior);
                        self.state.inline_error = Some(INLINE_UPDATE_FAILED.to_string());
                        SyncOutcome::Rejected
                    }
                };
                self.state.last_server_sync = false;
                outcome
            }
        };

        self.state.saving = false;
        outcome
    }

    /// Deletes a displayed note after `confirm` accepts the prompt.
    ///
    /// # Errors
    /// - Returns `NoteNotFound` when no displayed note carries `id`.
    pub fn delete(
        &mut self,
        id: &NoteId,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<SyncOutcome, ControllerError> {
        let note = self
            .state
            .find(id)
            .cloned()
            .ok_or_else(|| ControllerError::NoteNotFound(id.clone()))?;
        if !confirm(&delete_prompt(&note)) {
            return Ok(SyncOutcome::Cancelled);
        }

        self.state.inline_error = None;
        let prior = self.state.notes.clone();
        self.remove_note(&note.id);
        if self
            .state
            .selected_id()
            .is_some_and(|selected| selected.same_as(&note.id))
        {
            self.start_add();
        }

        let outcome = match self.api.delete_note(&note.id) {
            Ok(_) => {
                let remaining = prior
                    .into_iter()
                    .filter(|candidate| !candidate.id.same_as(&note.id))
                    .collect::<Vec<_>>();
                self.fallback.replace_notes(&remaining);
                self.mark_synced();
                info!("event=note_delete module=controller status=ok source=remote");
                SyncOutcome::Synced
            }
            Err(err) => {
                log_remote_failure("note_delete", Some(err));
                self.fallback.delete_note(&note.id);
                self.mark_local(INLINE_DELETED_LOCALLY);
                SyncOutcome::Local
            }
        };
        Ok(outcome)
    }

    fn remove_note(&mut self, id: &NoteId) {
        self.state.notes.retain(|note| !note.id.same_as(id));
    }

    fn replace_note(&mut self, id: &NoteId, replacement: Note) {
        if let Some(slot) = self.state.notes.iter_mut().find(|note| note.id.same_as(id)) {
            *slot = replacement;
        }
    }

    fn mark_synced(&mut self) {
        self.state.is_offline = false;
        self.state.banner_message = None;
        self.state.last_server_sync = true;
    }

    fn mark_local(&mut self, inline_error: &str) {
        self.state.is_offline = true;
        self.state.banner_message = Some(BANNER_SAVED_LOCALLY.to_string());
        self.state.inline_error = Some(inline_error.to_string());
        self.state.last_server_sync = false;
    }
}

fn log_remote_failure(event: &str, err: Option<ApiError>) {
    let code = err.as_ref().map_or("INVALID_RESPONSE", ApiError::code);
    warn!("event={event} module=controller status=fallback source=local error_code={code}");
}
