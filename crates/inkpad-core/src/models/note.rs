//! Note model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title used when a note has no usable text.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled Note";

/// An opaque note identifier.
///
/// Locally created notes get a UUID v7; rows created by the remote table keep
/// whatever id the backend generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Display title, bounded only by the UI
    pub title: String,
    /// Rich-text body serialized as an HTML fragment
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a new note with a fresh id and both timestamps set to now
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::new(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The note seeded on first run and for accounts with no notes yet
    #[must_use]
    pub fn welcome() -> Self {
        Self::new(WELCOME_TITLE, WELCOME_CONTENT)
    }

    /// Merge a patch into this note and stamp `updated_at`
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        self.updated_at = Utc::now();
    }
}

pub const WELCOME_TITLE: &str = "Welcome to Inkpad";

pub const WELCOME_CONTENT: &str = "<h1>Welcome to Inkpad</h1>\
<p>Start writing here. Your notes are kept on this device until you sign in.</p>\
<p>Sign in to keep your notes in your account and reach them from anywhere.</p>";

/// Partial update for a note; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotePatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Counters shown in the editor status bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteStats {
    pub words: usize,
    pub characters: usize,
    pub sentences: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_unique() {
        assert_ne!(NoteId::new(), NoteId::new());
    }

    #[test]
    fn test_note_id_keeps_backend_ids_verbatim() {
        let id = NoteId::from("42");
        assert_eq!(id.as_str(), "42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn test_note_new() {
        let note = Note::new("Groceries", "<p>milk</p>");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_apply_patch_merges_and_stamps() {
        let mut note = Note::new("Old", "<p>body</p>");
        let before = note.updated_at;
        note.apply(&NotePatch::title("New"));
        assert_eq!(note.title, "New");
        assert_eq!(note.content, "<p>body</p>");
        assert!(note.updated_at >= before);
    }

    #[test]
    fn test_note_serializes_camel_case_timestamps() {
        let note = Note::new("t", "c");
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_empty_patch() {
        assert!(NotePatch::default().is_empty());
        assert!(!NotePatch::content("x").is_empty());
    }
}
