//! Error types for inkpad-core

use thiserror::Error;

use crate::auth::AuthError;
use crate::remote::GatewayError;

/// Result type alias using inkpad-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in inkpad-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Operation requires a signed-in user
    #[error("You must be signed in to {0}")]
    Unauthorized(&'static str),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Rejected import source
    #[error("Unsupported file type: {0}. Please upload a .txt or .md file.")]
    UnsupportedImport(String),

    /// Remote notes table error
    #[error("Remote notes error: {0}")]
    Remote(#[from] GatewayError),

    /// Auth service error
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local key-value storage error
    #[error("Storage error: {0}")]
    Storage(String),
}
