use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] inkpad_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("No active note. Pass a note ID or run `inkpad open <id>`.")]
    NoActiveNote,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Auth is not configured. Run `inkpad config init` or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    AuthNotConfigured,
}

impl From<inkpad_core::auth::AuthError> for CliError {
    fn from(error: inkpad_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
