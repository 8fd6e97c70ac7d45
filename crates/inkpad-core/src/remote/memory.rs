//! In-process notes table.
//!
//! Enforces the same user scoping as the hosted table. It can be switched
//! into a failing mode, or told to fail one particular call, to exercise
//! fallback paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{GatewayError, GatewayResult, NoteOrder, NotesGateway, RemoteNote};
use crate::models::{NoteId, NotePatch};

#[derive(Clone, Default)]
pub struct MemoryNotesGateway {
    rows: Arc<Mutex<Vec<RemoteNote>>>,
    unavailable: Arc<AtomicBool>,
    inserts: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    planned: Arc<Mutex<PlannedFailures>>,
}

/// Countdowns to a single failing call; `Some(1)` fails the next one.
#[derive(Default)]
struct PlannedFailures {
    list: Option<usize>,
    insert: Option<usize>,
}

#[derive(Clone, Copy)]
enum PlannedCall {
    List,
    Insert,
}

fn count_down(slot: &mut Option<usize>) -> bool {
    match slot {
        Some(1) => {
            *slot = None;
            true
        }
        Some(remaining) => {
            *remaining -= 1;
            false
        }
        None => false,
    }
}

impl MemoryNotesGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the network were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the `n`th `list` call from now (1-based).
    pub fn fail_nth_list(&self, n: usize) {
        if let Ok(mut planned) = self.planned.lock() {
            planned.list = (n > 0).then_some(n);
        }
    }

    /// Fail the `n`th `insert` call from now (1-based).
    pub fn fail_nth_insert(&self, n: usize) {
        if let Ok(mut planned) = self.planned.lock() {
            planned.insert = (n > 0).then_some(n);
        }
    }

    /// Rows owned by `user_id`, newest update first.
    pub fn rows_for(&self, user_id: &str) -> Vec<RemoteNote> {
        let mut rows = self
            .lock()
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.user_id == user_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        sort_rows(&mut rows, NoteOrder::UpdatedDesc);
        rows
    }

    /// Successful inserts so far.
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Successful updates so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Successful deletes so far.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> GatewayResult<MutexGuard<'_, Vec<RemoteNote>>> {
        self.rows
            .lock()
            .map_err(|error| GatewayError::Api(error.to_string()))
    }

    fn ensure_available(&self) -> GatewayResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GatewayError::Api("network unavailable (503)".to_string()))
        } else {
            Ok(())
        }
    }

    fn planned_failure(&self, call: PlannedCall) -> GatewayResult<()> {
        let mut planned = self
            .planned
            .lock()
            .map_err(|error| GatewayError::Api(error.to_string()))?;
        let slot = match call {
            PlannedCall::List => &mut planned.list,
            PlannedCall::Insert => &mut planned.insert,
        };
        if count_down(slot) {
            Err(GatewayError::Api("request rejected (500)".to_string()))
        } else {
            Ok(())
        }
    }
}

fn sort_rows(rows: &mut [RemoteNote], order: NoteOrder) {
    match order {
        NoteOrder::UpdatedDesc => rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        NoteOrder::CreatedAsc => rows.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
}

#[async_trait]
impl NotesGateway for MemoryNotesGateway {
    async fn list(&self, user_id: &str, order: NoteOrder) -> GatewayResult<Vec<RemoteNote>> {
        self.ensure_available()?;
        self.planned_failure(PlannedCall::List)?;
        let mut rows = self
            .lock()?
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        sort_rows(&mut rows, order);
        Ok(rows)
    }

    async fn insert(&self, user_id: &str, title: &str, content: &str) -> GatewayResult<RemoteNote> {
        self.ensure_available()?;
        self.planned_failure(PlannedCall::Insert)?;
        let now = Utc::now();
        let row = RemoteNote {
            id: NoteId::new().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.lock()?.push(row.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    }

    async fn update(
        &self,
        id: &NoteId,
        user_id: &str,
        patch: &NotePatch,
    ) -> GatewayResult<RemoteNote> {
        self.ensure_available()?;
        let mut rows = self.lock()?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id.as_str() && row.user_id == user_id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        if let Some(title) = &patch.title {
            row.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            row.content.clone_from(content);
        }
        row.updated_at = Utc::now();
        let updated = row.clone();
        drop(rows);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn delete(&self, id: &NoteId, user_id: &str) -> GatewayResult<()> {
        self.ensure_available()?;
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|row| !(row.id == id.as_str() && row.user_id == user_id));
        if rows.len() == before {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        drop(rows);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
