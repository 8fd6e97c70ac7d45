//! Local/remote routing and the fallbacks taken when the remote rejects.

use std::sync::Arc;

use crate::models::{Note, NotePatch};
use crate::remote::{GatewayResult, NoteOrder, NotesGateway};
use crate::state::StoreMode;

/// Destination of a note store write, chosen from session state per call.
#[derive(Clone)]
pub(crate) enum Route {
    Local,
    Remote {
        gateway: Arc<dyn NotesGateway>,
        user_id: String,
    },
}

impl Route {
    pub(crate) const fn mode(&self) -> StoreMode {
        match self {
            Self::Local => StoreMode::Local,
            Self::Remote { .. } => StoreMode::Remote,
        }
    }
}

/// Outcome of copying local notes into a freshly signed-in account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The account already had notes, so nothing was copied
    pub skipped: bool,
    pub migrated: usize,
    /// Notes the remote rejected; they stay in the list as local-only notes
    pub failed: usize,
}

pub(crate) struct Migration {
    pub(crate) report: MigrationReport,
    /// Local notes that could not be inserted, in list order
    pub(crate) unmigrated: Vec<Note>,
}

/// Insert remotely, or create a local-only note when the insert is rejected.
pub(crate) async fn create_with_fallback(route: &Route, title: &str, content: &str) -> Note {
    let Route::Remote { gateway, user_id } = route else {
        return Note::new(title, content);
    };
    match gateway.insert(user_id, title, content).await {
        Ok(row) => row.into(),
        Err(error) => {
            tracing::warn!("Remote insert failed, keeping note locally: {}", error);
            Note::new(title, content)
        }
    }
}

/// Push a patch remotely; `merged` is the locally merged note kept on failure.
pub(crate) async fn update_with_fallback(route: &Route, merged: Note, patch: &NotePatch) -> Note {
    let Route::Remote { gateway, user_id } = route else {
        return merged;
    };
    match gateway.update(&merged.id, user_id, patch).await {
        Ok(row) => row.into(),
        Err(error) => {
            tracing::warn!(
                "Remote update of {} failed, keeping local changes: {}",
                merged.id,
                error
            );
            merged
        }
    }
}

/// The user's remote notes, newest update first.
pub(crate) async fn load_remote_notes(
    gateway: &dyn NotesGateway,
    user_id: &str,
) -> GatewayResult<Vec<Note>> {
    let mut notes = gateway
        .list(user_id, NoteOrder::UpdatedDesc)
        .await?
        .into_iter()
        .map(Note::from)
        .collect::<Vec<_>>();
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(notes)
}

/// One-time copy of local notes into an account that has none yet.
///
/// Notes are inserted oldest first so the remote update order matches the
/// local newest-first order. Individual insert failures are logged and the
/// notes handed back in [`Migration::unmigrated`]. A failed check of the
/// account's existing notes is returned as an error, since nothing can be
/// decided about the local notes without it.
pub(crate) async fn migrate_local_notes(
    gateway: &dyn NotesGateway,
    user_id: &str,
    local_notes: &[Note],
) -> GatewayResult<Migration> {
    let existing = gateway.list(user_id, NoteOrder::CreatedAsc).await?;
    if !existing.is_empty() {
        tracing::info!(
            "Account already holds {} notes, skipping local migration",
            existing.len()
        );
        return Ok(Migration {
            report: MigrationReport {
                skipped: true,
                ..MigrationReport::default()
            },
            unmigrated: Vec::new(),
        });
    }

    let mut report = MigrationReport::default();
    let mut unmigrated = Vec::new();
    for note in local_notes.iter().rev() {
        match gateway.insert(user_id, &note.title, &note.content).await {
            Ok(_) => report.migrated += 1,
            Err(error) => {
                report.failed += 1;
                tracing::warn!("Failed to migrate note {}: {}", note.id, error);
                unmigrated.insert(0, note.clone());
            }
        }
    }
    tracing::info!(
        "Migrated {} local notes ({} failed)",
        report.migrated,
        report.failed
    );
    Ok(Migration { report, unmigrated })
}
