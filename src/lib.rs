//! rondo, a headless music playback engine.
//!
//! Drives a single audio stream from an ordered track list: lifecycle
//! state machine, background position tracking, playlist auto-advance
//! and auto-skip error recovery. GUI and web frontends sit on top of
//! [`Player`] and the event callbacks; this crate owns no widget tree,
//! wire protocol or playlist file format.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod playlist;

pub use backend::{MediaBackend, RodioBackend};
pub use config::Settings;
pub use engine::{PlaybackState, Player};
pub use error::PlayerError;
pub use library::{Track, scan};
pub use playlist::{PlaylistHandle, PlaylistView};
