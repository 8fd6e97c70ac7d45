//! Remote notes table access.
//!
//! Every call is scoped by the owning user's id; update and delete also match
//! on the row id. Gateways never retry. Fallback policy belongs to the note
//! store.

mod memory;
mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use memory::MemoryNotesGateway;
pub use supabase::SupabaseNotesGateway;

use crate::models::{Note, NoteId, NotePatch};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No signed-in session for remote notes access")]
    Unauthenticated,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Notes API error: {0}")]
    Api(String),
    #[error("Note {0} was not found for this user")]
    NotFound(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Ordering requested from [`NotesGateway::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteOrder {
    /// Most recently updated first
    #[default]
    UpdatedDesc,
    /// Oldest first
    CreatedAsc,
}

impl NoteOrder {
    /// PostgREST `order` parameter value.
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::UpdatedDesc => "updated_at.desc",
            Self::CreatedAsc => "created_at.asc",
        }
    }
}

/// A row of the remote `notes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNote {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RemoteNote> for Note {
    fn from(row: RemoteNote) -> Self {
        Self {
            id: NoteId::from(row.id),
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Tables keyed by `bigint` return numeric ids; everything else is a string.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// CRUD against the remote notes table.
#[async_trait]
pub trait NotesGateway: Send + Sync {
    /// All rows owned by `user_id`, in the requested order.
    async fn list(&self, user_id: &str, order: NoteOrder) -> GatewayResult<Vec<RemoteNote>>;

    /// Insert a row and return it with the generated id and timestamps.
    async fn insert(&self, user_id: &str, title: &str, content: &str) -> GatewayResult<RemoteNote>;

    /// Patch the row matching both `id` and `user_id`.
    async fn update(
        &self,
        id: &NoteId,
        user_id: &str,
        patch: &NotePatch,
    ) -> GatewayResult<RemoteNote>;

    /// Remove the row matching both `id` and `user_id`.
    async fn delete(&self, id: &NoteId, user_id: &str) -> GatewayResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_note_accepts_numeric_ids_and_offsets() {
        let payload = r#"{
            "id": 17,
            "user_id": "user-1",
            "title": "Plan",
            "content": "<p>x</p>",
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "updated_at": "2024-03-02T10:00:00+00:00"
        }"#;
        let row: RemoteNote = serde_json::from_str(payload).unwrap();
        assert_eq!(row.id, "17");

        let note = Note::from(row);
        assert_eq!(note.id.as_str(), "17");
        assert!(note.updated_at > note.created_at);
    }

    #[test]
    fn remote_note_defaults_missing_text() {
        let payload = r#"{
            "id": "abc",
            "user_id": "u",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }"#;
        let row: RemoteNote = serde_json::from_str(payload).unwrap();
        assert!(row.title.is_empty());
        assert!(row.content.is_empty());
    }

    #[test]
    fn note_order_query_values() {
        assert_eq!(NoteOrder::UpdatedDesc.as_query(), "updated_at.desc");
        assert_eq!(NoteOrder::CreatedAsc.as_query(), "created_at.asc");
    }
}
