//! Data models for Inkpad

mod note;

pub use note::{
    Note, NoteId, NotePatch, NoteStats, UNTITLED_NOTE_TITLE, WELCOME_CONTENT, WELCOME_TITLE,
};
