//! Plain-text rendering of the notes screen.
//!
//! # Responsibility
//! - Turn a `ViewState` into terminal-friendly text blocks.
//! - Own display-only rules such as preview truncation.

use crate::model::note::Note;
use crate::service::notes_controller::{FormMode, ViewState};
use std::fmt::Write;

/// Maximum preview length (in chars) for list entries.
pub const PREVIEW_MAX_CHARS: usize = 120;

const ELLIPSIS: char = '…';

/// Shortens `text` to `max` chars, trimming and appending `…` when cut.
pub fn truncate_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut = text.chars().take(max).collect::<String>().trim().to_string();
    cut.push(ELLIPSIS);
    cut
}

/// Offline banner line, or `None` while online.
pub fn render_banner(state: &ViewState) -> Option<String> {
    if !state.is_offline {
        return None;
    }
    let mut line = String::from("Offline mode: Using local storage fallback.");
    if let Some(message) = state.banner_message.as_deref().filter(|m| !m.is_empty()) {
        line.push(' ');
        line.push_str(message);
    }
    Some(line)
}

/// Warning and error notices, in display order.
pub fn render_notices(state: &ViewState) -> Vec<String> {
    let mut notices = Vec::new();
    if let Some(load_error) = state.load_error.as_deref() {
        notices.push(format!("warning: {load_error}"));
    }
    if let Some(inline_error) = state.inline_error.as_deref() {
        notices.push(format!("error: {inline_error}"));
    }
    notices
}

/// The list panel: header, then loading, empty state or entries.
pub fn render_list(state: &ViewState) -> String {
    let mut out = format!("Your notes [{}]\n", state.sync_label());
    if state.loading {
        out.push_str("Loading notes…\n");
        return out;
    }
    if state.is_empty() {
        out.push_str("No notes yet\n");
        out.push_str(
            "Create your first note to keep track of ideas, tasks, or anything else.\n",
        );
        return out;
    }

    for note in &state.notes {
        let selected = state
            .selected_id()
            .is_some_and(|id| id.same_as(&note.id));
        let marker = if selected { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} [{}] {}", note.id, note.title);
        let preview = truncate_preview(&note.content, PREVIEW_MAX_CHARS);
        if !preview.is_empty() {
            let _ = writeln!(out, "      {}", preview.replace('\n', " "));
        }
    }
    out
}

/// Form panel heading for the current mode.
pub fn form_heading(mode: FormMode) -> &'static str {
    match mode {
        FormMode::Add => "Add a new note",
        FormMode::Edit => "Edit note",
    }
}

/// Submit button label for the current mode and saving flag.
pub fn submit_label(mode: FormMode, saving: bool) -> &'static str {
    match (saving, mode) {
        (true, _) => "Saving…",
        (false, FormMode::Edit) => "Save changes",
        (false, FormMode::Add) => "Add note",
    }
}

/// Full detail block for one note.
pub fn render_note(note: &Note) -> String {
    let mut out = format!("[{}] {}\n", note.id, note.title);
    if !note.content.is_empty() {
        out.push('\n');
        out.push_str(&note.content);
        if !note.content.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Whole screen: banner, notices, list, and the selected note when editing.
pub fn render_screen(state: &ViewState) -> String {
    let mut out = String::new();
    if let Some(banner) = render_banner(state) {
        let _ = writeln!(out, "{banner}");
    }
    for notice in render_notices(state) {
        let _ = writeln!(out, "{notice}");
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&render_list(state));
    if let (FormMode::Edit, Some(selected)) = (state.mode, state.selected.as_ref()) {
        let _ = writeln!(out, "\n{}", form_heading(state.mode));
        out.push_str(&render_note(selected));
    }
    out
}
