//! Error types for the playback engine.
//!
//! Load/play failures are never returned to host callers directly: the
//! engine forces `Stopped`, emits one `Error` event and (when auto-advance
//! is on) tries to skip forward. The only fatal variant is `BackendInit`,
//! raised from backend construction.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    /// The media file is gone (deleted, unmounted, renamed).
    #[error("media file not found: {}", .0.display())]
    MediaNotFound(PathBuf),

    /// The file exists but cannot be decoded.
    #[error("media file cannot be played: {}: {reason}", path.display())]
    MediaUnplayable { path: PathBuf, reason: String },

    /// The audio output device could not be opened. Fatal: the engine
    /// cannot exist without a backend.
    #[error("audio backend initialization failed: {0}")]
    BackendInit(String),

    /// A subscriber callback panicked during dispatch. Always swallowed
    /// and logged, never propagated into engine control flow.
    #[error("subscriber callback panicked during {0} dispatch")]
    CallbackFailure(&'static str),

    /// The non-looping end of the playlist was reached. Silent end of an
    /// auto-advance chain, not surfaced as an error event.
    #[error("playlist exhausted")]
    PlaylistExhausted,
}
