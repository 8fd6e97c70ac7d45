//! Store-wide debounce slot for auto-save.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::models::NoteId;

pub(crate) struct PendingSave {
    pub(crate) id: NoteId,
    pub(crate) content: String,
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    pending: Option<PendingSave>,
}

/// Holds at most one scheduled save; scheduling another cancels it.
#[derive(Default)]
pub(crate) struct AutoSaveSlot {
    slot: Mutex<Slot>,
}

impl AutoSaveSlot {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Abort any pending save and install the one produced by `spawn`.
    ///
    /// `spawn` runs with the slot locked, so the new timer cannot claim the
    /// slot before it is installed.
    pub(crate) fn schedule(
        &self,
        id: NoteId,
        content: String,
        spawn: impl FnOnce(u64) -> JoinHandle<()>,
    ) {
        let mut slot = self.lock();
        if let Some(previous) = slot.pending.take() {
            previous.handle.abort();
            tracing::debug!("Superseded pending auto-save for {}", previous.id);
        }
        slot.generation += 1;
        let generation = slot.generation;
        let handle = spawn(generation);
        slot.pending = Some(PendingSave {
            id,
            content,
            generation,
            handle,
        });
    }

    /// Claim the slot for a timer that just fired.
    ///
    /// Returns `false` when a newer save replaced this one in the meantime.
    pub(crate) fn claim(&self, generation: u64) -> bool {
        let mut slot = self.lock();
        if slot
            .pending
            .as_ref()
            .is_some_and(|save| save.generation == generation)
        {
            slot.pending = None;
            true
        } else {
            false
        }
    }

    /// Cancel the timer and hand back the pending save, if any.
    pub(crate) fn take(&self) -> Option<PendingSave> {
        let pending = self.lock().pending.take()?;
        pending.handle.abort();
        Some(pending)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }
}
