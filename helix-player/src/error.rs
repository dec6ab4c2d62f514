//! Error types for helix-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use helix_common::{ItemKind, PlaylistId};
use thiserror::Error;

/// Main error type for helix-player
#[derive(Error, Debug)]
pub enum Error {
    /// No sink of the item's family accepts any of its candidate mimetypes
    #[error("cannot enqueue item: directory {directory}, id {id}, kind {kind}")]
    NotPlayable {
        directory: String,
        id: String,
        kind: ItemKind,
    },

    /// Operation rejected in the current queue state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Unknown playlist id
    #[error("Queue entry not found: {0}")]
    NotFound(PlaylistId),

    /// Queue Store / Reconciler coordination bug; never retried
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Malformed request (bad list edit, bad seek position)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine task is no longer running
    #[error("Playback engine stopped")]
    EngineStopped,

    /// Errors from helix-common
    #[error(transparent)]
    Common(#[from] helix_common::Error),
}

impl Error {
    /// Fatal errors stop the engine instead of being reported and absorbed
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}

/// Convenience Result type using helix-player Error
pub type Result<T> = std::result::Result<T, Error>;
