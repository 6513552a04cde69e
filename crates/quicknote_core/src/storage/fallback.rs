//! Local fallback persistence for notes.
//!
//! # Responsibility
//! - Mirror the displayed note list into one persisted slot.
//! - Serve create/update/delete when the remote API is unreachable.
//!
//! # Invariants
//! - The slot holds a single JSON array of notes.
//! - Loading never fails: corrupt or missing data reads as an empty list.
//! - Write failures are logged and never abort the user action.

use crate::model::note::{
    coerce_text, generate_local_id, has_string_field, Note, NoteDraft, NoteId,
};
use crate::storage::kv::{KeyValueStore, StoreResult};
use log::{debug, warn};
use serde_json::Value;

/// Slot key holding the serialized fallback list.
pub const FALLBACK_STORAGE_KEY: &str = "notes_fallback";

/// Note list persisted in a key/value slot.
pub struct LocalFallback<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> LocalFallback<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying slot store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted list.
    ///
    /// Entries without a string `title` are dropped; entries without an id
    /// receive a fresh local id.
    pub fn load_notes(&self) -> Vec<Note> {
        let raw = match self.store.get(FALLBACK_STORAGE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(err) => {
                warn!("event=fallback_load module=storage status=error error={err}");
                return Vec::new();
            }
        };

        let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(&raw) else {
            warn!("event=fallback_load module=storage status=error error_code=corrupt_slot");
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(Value::as_object)
            .filter(|entry| has_string_field(entry, "title"))
            .map(|entry| Note {
                id: entry
                    .get("id")
                    .and_then(NoteId::from_json)
                    .unwrap_or_else(generate_local_id),
                title: coerce_text(entry.get("title")),
                content: coerce_text(entry.get("content")),
            })
            .collect()
    }

    /// Persists the full list, replacing previous contents.
    pub fn save_notes(&mut self, notes: &[Note]) -> StoreResult<()> {
        let raw = serde_json::to_string(notes)?;
        self.store.set(FALLBACK_STORAGE_KEY, &raw)?;
        debug!(
            "event=fallback_save module=storage status=ok count={}",
            notes.len()
        );
        Ok(())
    }

    /// Creates a note with a local id at the head of the list.
    pub fn create_note(&mut self, draft: &NoteDraft) -> Note {
        let created = Note {
            id: generate_local_id(),
            title: draft.title().to_string(),
            content: draft.content().to_string(),
        };
        let mut next = vec![created.clone()];
        next.extend(self.load_notes());
        self.persist(&next);
        created
    }

    /// Replaces title and content of the matching note.
    ///
    /// Returns `None` when no persisted note carries `id`.
    pub fn update_note(&mut self, id: &NoteId, draft: &NoteDraft) -> Option<Note> {
        let next = self
            .load_notes()
            .into_iter()
            .map(|note| {
                if note.id.same_as(id) {
                    note.with_draft(draft)
                } else {
                    note
                }
            })
            .collect::<Vec<_>>();
        self.persist(&next);
        next.into_iter().find(|note| note.id.same_as(id))
    }

    /// Removes the matching note and returns the remaining list.
    pub fn delete_note(&mut self, id: &NoteId) -> Vec<Note> {
        let next = self
            .load_notes()
            .into_iter()
            .filter(|note| !note.id.same_as(id))
            .collect::<Vec<_>>();
        self.persist(&next);
        next
    }

    /// Overwrites the persisted list and returns it as reloaded.
    pub fn replace_notes(&mut self, notes: &[Note]) -> Vec<Note> {
        self.persist(notes);
        self.load_notes()
    }

    fn persist(&mut self, notes: &[Note]) {
        if let Err(err) = self.save_notes(notes) {
            warn!("event=fallback_save module=storage status=error error={err}");
        }
    }
}
