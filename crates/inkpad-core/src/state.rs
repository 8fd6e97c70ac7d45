//! Shared state types exposed to front ends.

use serde::{Deserialize, Serialize};

/// Where the note store currently routes reads and writes.
///
/// Derived from session presence on every change and never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    #[default]
    Local,
    Remote,
}

impl StoreMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Change notification sent after every successful mutation or reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Changed,
}
