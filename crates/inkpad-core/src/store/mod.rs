//! The note store: authoritative note list, active pointer and routing.
//!
//! While anonymous every operation goes to the local mirror. Once a session
//! exists, writes go to the remote table first and the resulting list is
//! mirrored locally as an offline cache. Remote rejections fall back to the
//! local path, except delete, which reports the failure.

mod autosave;
mod route;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use autosave::AutoSaveSlot;
pub use route::MigrationReport;
use route::{
    create_with_fallback, load_remote_notes, migrate_local_notes, update_with_fallback, Route,
};

use crate::auth::{AuthUser, SessionWatch};
use crate::config::StoreOptions;
use crate::export::{
    export_note_text, import_title, is_supported_import, plain_text_to_html, TextExport,
};
use crate::local::LocalStore;
use crate::models::{Note, NoteId, NotePatch, NoteStats, UNTITLED_NOTE_TITLE};
use crate::remote::{GatewayError, NotesGateway};
use crate::state::{StoreEvent, StoreMode};
use crate::text::{derive_title, note_stats, strip_tags};
use crate::{Error, Result};

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct StoreState {
    /// Newest first
    notes: Vec<Note>,
    active_id: Option<NoteId>,
    user: Option<AuthUser>,
}

impl StoreState {
    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }

    /// Keep the active pointer valid: the preferred id if present, else the
    /// first note, else nothing.
    fn settle_active(&mut self, preferred: Option<NoteId>) {
        self.active_id = preferred
            .filter(|id| self.position(id).is_some())
            .or_else(|| self.notes.first().map(|note| note.id.clone()));
    }
}

struct Inner {
    state: Mutex<StoreState>,
    local: LocalStore,
    gateway: Option<Arc<dyn NotesGateway>>,
    events: broadcast::Sender<StoreEvent>,
    autosave: AutoSaveSlot,
    options: StoreOptions,
}

/// Shared handle to the note store; clones refer to the same notes.
#[derive(Clone)]
pub struct NoteStore {
    inner: Arc<Inner>,
}

impl NoteStore {
    /// Create an empty store. Call [`NoteStore::bootstrap`] before use.
    ///
    /// Without a gateway the store stays local even when a session exists.
    pub fn new(
        local: LocalStore,
        gateway: Option<Arc<dyn NotesGateway>>,
        options: StoreOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState::default()),
                local,
                gateway,
                events,
                autosave: AutoSaveSlot::default(),
                options,
            }),
        }
    }

    /// Load the local mirror, seeding a welcome note when it is empty.
    pub async fn bootstrap(&self) {
        let mut state = self.inner.state.lock().await;
        self.load_local_into(&mut state);
        self.mirror(&state);
        drop(state);
        self.notify();
    }

    /// Receive a [`StoreEvent`] after every mutation and reload.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// React to a session transition.
    ///
    /// Signing in migrates local notes into an empty account, then reloads
    /// from the remote table. Signing out reloads from the local mirror
    /// without contacting the remote. Returns the migration outcome when one
    /// was attempted.
    ///
    /// # Errors
    ///
    /// Fails when the account's notes cannot be listed before migrating. The
    /// store then stays local with its notes untouched, and the next call for
    /// the same user retries the migration.
    pub async fn apply_session(&self, user: Option<AuthUser>) -> Result<Option<MigrationReport>> {
        let mut state = self.inner.state.lock().await;
        let previous = state.user.as_ref().map(|user| user.id.clone());
        let next = user.as_ref().map(|user| user.id.clone());
        if previous == next {
            state.user = user;
            return Ok(None);
        }

        let report = match (previous, user) {
            (_, None) => {
                tracing::info!("Signed out, switching to local notes");
                state.user = None;
                self.load_local_into(&mut state);
                None
            }
            (previous, Some(user)) => {
                tracing::info!("Signed in as {}, switching to remote notes", user.id);
                state.user = Some(user);
                match self.route(&state) {
                    Route::Remote { gateway, user_id } if previous.is_none() => {
                        let migration =
                            match migrate_local_notes(gateway.as_ref(), &user_id, &state.notes)
                                .await
                            {
                                Ok(migration) => migration,
                                Err(error) => {
                                    tracing::warn!(
                                        "Could not check remote notes, keeping local notes: {}",
                                        error
                                    );
                                    state.user = None;
                                    return Err(error.into());
                                }
                            };
                        self.load_remote_into(
                            &mut state,
                            gateway.as_ref(),
                            &user_id,
                            migration.unmigrated,
                        )
                        .await;
                        Some(migration.report)
                    }
                    // Another account's notes must never be copied over.
                    Route::Remote { gateway, user_id } => {
                        self.load_remote_into(&mut state, gateway.as_ref(), &user_id, Vec::new())
                            .await;
                        None
                    }
                    Route::Local => {
                        tracing::warn!("No remote notes gateway configured, staying local");
                        None
                    }
                }
            }
        };

        self.mirror(&state);
        drop(state);
        self.notify();
        Ok(report)
    }

    /// Follow session transitions published by the auth session manager.
    pub fn watch_session(&self, mut session: SessionWatch) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                let current = session.borrow_and_update().clone();
                if current.is_resolved() {
                    if let Err(error) = store.apply_session(current.user().cloned()).await {
                        tracing::warn!("Session change left notes local: {}", error);
                    }
                }
                if session.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Notes in display order: newest first.
    pub async fn list(&self) -> Vec<Note> {
        self.inner.state.lock().await.notes.clone()
    }

    pub async fn get(&self, id: &NoteId) -> Option<Note> {
        let state = self.inner.state.lock().await;
        state.position(id).map(|index| state.notes[index].clone())
    }

    pub async fn active_id(&self) -> Option<NoteId> {
        self.inner.state.lock().await.active_id.clone()
    }

    pub async fn active_note(&self) -> Option<Note> {
        let state = self.inner.state.lock().await;
        let id = state.active_id.as_ref()?;
        state.position(id).map(|index| state.notes[index].clone())
    }

    pub async fn mode(&self) -> StoreMode {
        let state = self.inner.state.lock().await;
        self.route(&state).mode()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.state.lock().await.user.is_some()
    }

    /// Create a note at the front of the list and make it active.
    ///
    /// A rejected remote insert still yields a note, kept locally.
    pub async fn create(&self, title: Option<&str>, content: Option<&str>) -> Note {
        let title = title.unwrap_or(UNTITLED_NOTE_TITLE);
        let content = content.unwrap_or_default();

        let mut state = self.inner.state.lock().await;
        let route = self.route(&state);
        let note = create_with_fallback(&route, title, content).await;
        state.notes.insert(0, note.clone());
        state.active_id = Some(note.id.clone());
        self.mirror(&state);
        drop(state);

        tracing::debug!("Created note {} ({})", note.id, route.mode().label());
        self.notify();
        note
    }

    /// Merge `patch` into a note. Returns `None` for unknown ids.
    pub async fn update(&self, id: &NoteId, patch: &NotePatch) -> Option<Note> {
        let mut state = self.inner.state.lock().await;
        let index = state.position(id)?;
        let mut merged = state.notes[index].clone();
        merged.apply(patch);

        let route = self.route(&state);
        let note = update_with_fallback(&route, merged, patch).await;
        state.notes[index] = note.clone();
        self.mirror(&state);
        drop(state);

        self.notify();
        Some(note)
    }

    /// Save content and retitle the note from its first line of text.
    pub async fn update_title_from_content(&self, id: &NoteId, content: &str) -> Option<Note> {
        let patch = NotePatch::content(content).with_title(derive_title(content));
        self.update(id, &patch).await
    }

    /// Delete a note; requires a signed-in session.
    ///
    /// The remote row is removed first and its failure is returned unchanged,
    /// leaving the list untouched. A note with no remote row is removed
    /// locally. If the note was active, the note that
    /// followed it (or the new last note) becomes active.
    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.user.is_none() {
            return Err(Error::Unauthorized("delete notes"));
        }
        let index = state
            .position(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Route::Remote { gateway, user_id } = self.route(&state) {
            match gateway.delete(id, &user_id).await {
                Ok(()) => {}
                // Notes kept locally after a rejected insert have no row.
                Err(GatewayError::NotFound(_)) => {
                    tracing::debug!("Note {} has no remote row, removing locally", id);
                }
                Err(error) => return Err(error.into()),
            }
        }

        state.notes.remove(index);
        if state.active_id.as_ref() == Some(id) {
            state.active_id = state
                .notes
                .get(index)
                .or_else(|| state.notes.last())
                .map(|note| note.id.clone());
        }
        self.mirror(&state);
        drop(state);

        tracing::debug!("Deleted note {}", id);
        self.notify();
        Ok(())
    }

    /// Point the editor at another note. Unknown ids are ignored.
    pub async fn set_active(&self, id: &NoteId) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.position(id).is_none() || state.active_id.as_ref() == Some(id) {
            return false;
        }
        state.active_id = Some(id.clone());
        self.mirror(&state);
        drop(state);
        self.notify();
        true
    }

    /// Status-bar counters for a piece of content.
    pub fn get_stats(&self, content: &str) -> NoteStats {
        note_stats(content)
    }

    /// Create a note from plain text, one paragraph per non-empty line.
    pub async fn import_text(&self, content: &str, filename: Option<&str>) -> Note {
        let title = import_title(filename);
        let html = plain_text_to_html(content);
        self.create(Some(&title), Some(&html)).await
    }

    /// Like [`NoteStore::import_text`], rejecting anything but text/markdown.
    pub async fn import_file(
        &self,
        content: &str,
        filename: &str,
        mime_type: Option<&str>,
    ) -> Result<Note> {
        if !is_supported_import(mime_type, filename) {
            return Err(Error::UnsupportedImport(
                mime_type.unwrap_or(filename).to_string(),
            ));
        }
        Ok(self.import_text(content, Some(filename)).await)
    }

    /// Plain-text rendering of a note and a file name to save it under.
    pub async fn export_text(&self, id: &NoteId) -> Option<TextExport> {
        self.get(id).await.map(|note| export_note_text(&note))
    }

    /// Case-insensitive match over titles and visible text.
    pub async fn search(&self, query: &str) -> Vec<Note> {
        let needle = query.trim().to_lowercase();
        let state = self.inner.state.lock().await;
        if needle.is_empty() {
            return state.notes.clone();
        }
        state
            .notes
            .iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&needle)
                    || strip_tags(&note.content).to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Schedule a debounced save of `content` into note `id`.
    ///
    /// Only runs with a session. A later call replaces any pending save, so
    /// rapid edits produce one write carrying the last content. Returns
    /// whether a save was scheduled.
    pub async fn auto_save(&self, id: &NoteId, content: impl Into<String>) -> bool {
        if !self.is_authenticated().await {
            return false;
        }

        let content = content.into();
        let delay = self.inner.options.autosave_debounce;
        self.inner
            .autosave
            .schedule(id.clone(), content.clone(), |generation| {
                let store = self.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if store.inner.autosave.claim(generation) {
                        store.update_title_from_content(&id, &content).await;
                    }
                })
            });
        true
    }

    /// Write the pending auto-save now instead of waiting for the timer.
    pub async fn flush_auto_save(&self) -> Option<Note> {
        let pending = self.inner.autosave.take()?;
        self.update_title_from_content(&pending.id, &pending.content)
            .await
    }

    pub fn has_pending_auto_save(&self) -> bool {
        self.inner.autosave.is_pending()
    }

    fn route(&self, state: &StoreState) -> Route {
        match (&self.inner.gateway, &state.user) {
            (Some(gateway), Some(user)) => Route::Remote {
                gateway: Arc::clone(gateway),
                user_id: user.id.clone(),
            },
            _ => Route::Local,
        }
    }

    fn load_local_into(&self, state: &mut StoreState) {
        let snapshot = self.inner.local.load();
        state.notes = snapshot.notes;
        if state.notes.is_empty() {
            tracing::info!("No local notes found, seeding welcome note");
            state.notes.push(Note::welcome());
        }
        state.settle_active(snapshot.active_id);
    }

    /// Replace the list with the user's remote notes. `carried` notes have no
    /// remote row yet and are kept in front of them.
    async fn load_remote_into(
        &self,
        state: &mut StoreState,
        gateway: &dyn NotesGateway,
        user_id: &str,
        carried: Vec<Note>,
    ) {
        let preferred = state.active_id.clone();
        match load_remote_notes(gateway, user_id).await {
            Ok(notes) if notes.is_empty() && carried.is_empty() => {
                let welcome = Note::welcome();
                let seeded = match gateway
                    .insert(user_id, &welcome.title, &welcome.content)
                    .await
                {
                    Ok(row) => row.into(),
                    Err(error) => {
                        tracing::warn!("Failed to seed remote welcome note: {}", error);
                        welcome
                    }
                };
                state.notes = vec![seeded];
                state.settle_active(preferred);
            }
            Ok(notes) => {
                tracing::info!(
                    "Loaded {} remote notes ({} kept local)",
                    notes.len(),
                    carried.len()
                );
                state.notes = carried;
                state.notes.extend(notes);
                state.settle_active(preferred);
            }
            Err(error) => {
                tracing::warn!("Failed to load remote notes, using local copy: {}", error);
                self.load_local_into(state);
            }
        }
    }

    fn mirror(&self, state: &StoreState) {
        if let Err(error) = self
            .inner
            .local
            .save(&state.notes, state.active_id.as_ref())
        {
            tracing::warn!("Failed to mirror notes locally: {}", error);
        }
    }

    fn notify(&self) {
        let _ = self.inner.events.send(StoreEvent::Changed);
    }
}
