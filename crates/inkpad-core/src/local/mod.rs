//! Durable key-value mirror of the note list.
//!
//! The store keeps exactly two string entries: the JSON-serialized list and
//! the active note id. Every save overwrites both; there is no merging.

mod storage;

use std::sync::Arc;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

use crate::models::{Note, NoteId};
use crate::Result;

pub const NOTES_KEY: &str = "inkpad.notes";
pub const ACTIVE_NOTE_KEY: &str = "inkpad.activeNoteId";

/// What a previous session left behind in local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    pub notes: Vec<Note>,
    pub active_id: Option<NoteId>,
}

#[derive(Clone)]
pub struct LocalStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl LocalStore {
    pub fn new(storage: impl KeyValueStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Local store backed by process memory (tests and throwaway sessions).
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default())
    }

    /// Overwrite the stored list and active id.
    pub fn save(&self, notes: &[Note], active_id: Option<&NoteId>) -> Result<()> {
        let serialized = serde_json::to_string(notes)?;
        self.storage.set_item(NOTES_KEY, &serialized)?;
        self.storage
            .set_item(ACTIVE_NOTE_KEY, active_id.map_or("", NoteId::as_str))?;
        tracing::debug!("Mirrored {} notes to local storage", notes.len());
        Ok(())
    }

    /// Read the stored list; missing or unreadable data yields an empty list.
    pub fn load(&self) -> LocalSnapshot {
        let notes = match self.storage.get_item(NOTES_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Note>>(&raw).unwrap_or_else(|error| {
                tracing::warn!("Discarding malformed local notes: {}", error);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!("Failed to read local notes: {}", error);
                Vec::new()
            }
        };

        let active_id = self
            .storage
            .get_item(ACTIVE_NOTE_KEY)
            .unwrap_or_else(|error| {
                tracing::warn!("Failed to read active note id: {}", error);
                None
            })
            .filter(|id| !id.trim().is_empty())
            .map(NoteId::from);

        LocalSnapshot { notes, active_id }
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(NOTES_KEY)?;
        self.storage.remove_item(ACTIVE_NOTE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn save_and_load_keeps_order_and_active_id() {
        let store = LocalStore::in_memory();
        let first = Note::new("First", "<p>1</p>");
        let second = Note::new("Second", "<p>2</p>");
        let notes = vec![second.clone(), first];

        store.save(&notes, Some(&second.id)).unwrap();
        let snapshot = store.load();

        assert_eq!(snapshot.notes, notes);
        assert_eq!(snapshot.active_id, Some(second.id));
    }

    #[test]
    fn empty_active_id_loads_as_none() {
        let store = LocalStore::in_memory();
        store.save(&[], None).unwrap();
        assert_eq!(store.load(), LocalSnapshot::default());
    }

    #[test]
    fn malformed_notes_load_as_empty() {
        let storage = MemoryStorage::default();
        storage.set_item(NOTES_KEY, "{not json").unwrap();
        storage.set_item(ACTIVE_NOTE_KEY, "abc").unwrap();
        let store = LocalStore::new(storage);

        let snapshot = store.load();
        assert!(snapshot.notes.is_empty());
        assert_eq!(snapshot.active_id, Some(NoteId::from("abc")));
    }

    #[test]
    fn clear_removes_both_entries() {
        let store = LocalStore::in_memory();
        let note = Note::new("t", "c");
        store.save(std::slice::from_ref(&note), Some(&note.id)).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), LocalSnapshot::default());
    }
}
