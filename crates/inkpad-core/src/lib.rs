//! inkpad-core - Core library for Inkpad
//!
//! This crate contains the note model, the local mirror, the remote notes
//! gateway, Supabase auth sessions and the note store that routes between
//! them. Front ends (the CLI today) drive everything through [`NoteStore`].

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod local;
pub mod models;
pub mod remote;
pub mod state;
pub mod store;
pub mod text;
pub mod util;

pub use error::{Error, Result};
pub use models::{Note, NoteId, NotePatch, NoteStats};
pub use state::{StoreEvent, StoreMode};
pub use store::{MigrationReport, NoteStore};
