//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by remote and local stores.
//! - Coerce loosely-typed JSON payloads into display-safe notes.
//! - Validate user submissions before they reach any store.
//!
//! # Invariants
//! - Every `Note` has an id and string `title`/`content`.
//! - Ids are compared by their string form (`"1"` matches `1`).
//! - A `NoteDraft` title is trimmed and never empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const LOCAL_ID_PREFIX: &str = "local_";
const TEMP_ID_PREFIX: &str = "temp_";
const LOCAL_ID_RANDOM_CHARS: usize = 8;

/// Opaque note identifier assigned by whichever store created the note.
///
/// Remote APIs may hand out numbers or strings; local ids are always text.
/// Equality and hashing use the string form, so `Number(1) == Text("1")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteId {
    Number(i64),
    Text(String),
}

impl NoteId {
    /// Returns whether both ids refer to the same note.
    pub fn same_as(&self, other: &NoteId) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    /// Returns whether this id was minted by the local fallback store.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Text(value) if value.starts_with(LOCAL_ID_PREFIX))
    }

    /// Returns whether this id is a client-side placeholder awaiting the server.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Text(value) if value.starts_with(TEMP_ID_PREFIX))
    }

    /// Converts a JSON id value. `null` and structured values have no id.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(match number.as_i64() {
                Some(int) => Self::Number(int),
                None => Self::Text(number.to_string()),
            }),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Bool(flag) => Some(Self::Text(flag.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl PartialEq for NoteId {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for NoteId {}

impl Hash for NoteId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for NoteId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Canonical note record as displayed and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
}

impl Note {
    pub fn new(id: impl Into<NoteId>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Returns a copy of this note carrying the draft's title and content.
    pub fn with_draft(&self, draft: &NoteDraft) -> Self {
        Self {
            id: self.id.clone(),
            title: draft.title().to_string(),
            content: draft.content().to_string(),
        }
    }
}

/// Validation failures for user-submitted note payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    TitleRequired,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleRequired => f.write_str("Title is required."),
        }
    }
}

impl Error for NoteValidationError {}

/// Validated create/update payload.
///
/// Serializes as `{"title": ..., "content": ...}`, the request body shape of
/// the notes API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Builds a draft from raw form input.
    ///
    /// The title is trimmed; content is kept verbatim.
    ///
    /// # Errors
    /// - Returns `TitleRequired` when the trimmed title is empty.
    pub fn new(
        title: impl AsRef<str>,
        content: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(NoteValidationError::TitleRequired);
        }
        Ok(Self {
            title: title.to_string(),
            content: content.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Coerces an arbitrary JSON value into display text.
///
/// Strings are kept, `null` becomes empty, everything else uses JSON text.
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Normalizes a remote list payload into display-safe notes.
///
/// Rules:
/// - Non-array payloads yield an empty list.
/// - Entries that are not objects, or carry neither a string `title` nor a
///   string `content`, are dropped.
/// - Entries without a usable id are dropped.
pub fn normalize_remote_notes(payload: &Value) -> Vec<Note> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .filter(|entry| has_string_field(entry, "title") || has_string_field(entry, "content"))
        .filter_map(|entry| {
            let id = entry.get("id").and_then(NoteId::from_json)?;
            Some(note_from_fields(id, entry))
        })
        .collect()
}

/// Coerces a single create/update response body into a note.
///
/// `fallback_id` is used when the body carries no id; create flows pass
/// `None` so that an id-less response is rejected.
pub fn note_from_response(payload: &Value, fallback_id: Option<&NoteId>) -> Option<Note> {
    let entry = payload.as_object()?;
    let id = entry
        .get("id")
        .and_then(NoteId::from_json)
        .or_else(|| fallback_id.cloned())?;
    Some(note_from_fields(id, entry))
}

pub(crate) fn note_from_fields(id: NoteId, entry: &Map<String, Value>) -> Note {
    Note {
        id,
        title: coerce_text(entry.get("title")),
        content: coerce_text(entry.get("content")),
    }
}

pub(crate) fn has_string_field(entry: &Map<String, Value>, field: &str) -> bool {
    matches!(entry.get(field), Some(Value::String(_)))
}

/// Generates an id for notes created by the local fallback store.
///
/// Format: `local_<epoch-ms base36>_<8 random chars>`.
pub fn generate_local_id() -> NoteId {
    let random = Uuid::new_v4().simple().to_string();
    NoteId::Text(format!(
        "{LOCAL_ID_PREFIX}{}_{}",
        to_base36(epoch_millis()),
        &random[..LOCAL_ID_RANDOM_CHARS]
    ))
}

/// Generates a placeholder id for optimistic inserts.
pub fn generate_temp_id() -> NoteId {
    NoteId::Text(format!(
        "{TEMP_ID_PREFIX}{}_{}",
        epoch_millis(),
        Uuid::new_v4().simple()
    ))
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        generate_local_id, generate_temp_id, note_from_response, normalize_remote_notes,
        to_base36, NoteDraft, NoteId, NoteValidationError,
    };
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn draft_trims_title_and_keeps_content_verbatim() {
        let draft = NoteDraft::new("  Groceries ", "  milk\n").unwrap();
        assert_eq!(draft.title(), "Groceries");
        assert_eq!(draft.content(), "  milk\n");
    }

    #[test]
    fn draft_rejects_blank_title() {
        let err = NoteDraft::new("   ", "body").unwrap_err();
        assert_eq!(err, NoteValidationError::TitleRequired);
        assert_eq!(err.to_string(), "Title is required.");
    }

    #[test]
    fn ids_match_across_number_and_text() {
        assert!(NoteId::from(1_i64).same_as(&NoteId::from("1")));
        assert!(!NoteId::from(1_i64).same_as(&NoteId::from("01")));
    }

    #[test]
    fn equal_ids_share_one_map_entry() {
        assert_eq!(NoteId::Number(1), NoteId::from("1"));

        let mut titles = HashMap::new();
        titles.insert(NoteId::Number(1), "server");
        titles.insert(NoteId::from("1"), "typed");
        assert_eq!(titles.len(), 1);
        assert_eq!(titles.get(&NoteId::Number(1)), Some(&"typed"));
    }

    #[test]
    fn normalize_drops_invalid_entries_and_coerces_fields() {
        let payload = json!([
            {"id": 1, "title": "One", "content": null},
            {"id": "2", "content": "only content"},
            {"id": 3, "title": 7, "content": 8},
            {"title": "no id"},
            "not an object",
            null
        ]);

        let notes = normalize_remote_notes(&payload);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, NoteId::Number(1));
        assert_eq!(notes[0].content, "");
        assert_eq!(notes[1].id, NoteId::from("2"));
        assert_eq!(notes[1].title, "");
    }

    #[test]
    fn normalize_non_array_is_empty() {
        assert!(normalize_remote_notes(&json!({"notes": []})).is_empty());
        assert!(normalize_remote_notes(&json!(null)).is_empty());
    }

    #[test]
    fn response_without_id_uses_fallback_only_when_given() {
        let body = json!({"title": "t", "content": "c"});
        assert!(note_from_response(&body, None).is_none());
        let kept = note_from_response(&body, Some(&NoteId::from("x"))).unwrap();
        assert_eq!(kept.id, NoteId::from("x"));
        assert!(note_from_response(&json!(null), Some(&NoteId::from("x"))).is_none());
    }

    #[test]
    fn generated_ids_carry_expected_prefixes() {
        let local = generate_local_id();
        assert!(local.is_local());
        assert!(!local.is_temporary());
        assert!(generate_temp_id().is_temporary());
        assert_ne!(generate_local_id(), generate_local_id());
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
