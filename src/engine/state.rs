//! Lifecycle state and the mutex-guarded engine snapshot.

use std::time::{Duration, Instant};

use crate::engine::events::EngineEvent;
use crate::library::Track;

/// The lifecycle state of the engine.
///
/// `Loading` is transient: it only exists inside an operation, between
/// asking the backend for a file and hearing back.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Loading,
    Playing,
    Paused,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Stopped
    }
}

/// Everything the engine knows about the current playback, guarded by
/// one mutex in [`super::player`].
pub(crate) struct EngineState {
    pub lifecycle: PlaybackState,
    pub current: Option<Track>,
    pub position: Duration,
    pub duration: Duration,
    pub volume: f32,
    pub auto_advance: bool,

    // Elapsed-time bookkeeping: wall-clock start of the playing stretch
    // plus time accumulated across pauses.
    pub started_at: Option<Instant>,
    pub accumulated: Duration,
}

impl EngineState {
    pub fn new(volume: f32, auto_advance: bool) -> Self {
        Self {
            lifecycle: PlaybackState::default(),
            current: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: volume.clamp(0.0, 1.0),
            auto_advance,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Transition to `next`, queueing a state-changed event only when the
    /// state actually differs.
    pub fn set_lifecycle(&mut self, next: PlaybackState, events: &mut Vec<EngineEvent>) {
        if self.lifecycle == next {
            return;
        }
        self.lifecycle = next;
        events.push(EngineEvent::StateChanged(next));
    }

    /// Elapsed time right now, clamped into `[0, duration]`.
    pub fn live_position(&self) -> Duration {
        let raw = match (self.lifecycle, self.started_at) {
            (PlaybackState::Playing, Some(t)) => self.accumulated + t.elapsed(),
            _ => self.position,
        };
        self.clamp(raw)
    }

    pub fn sample_position(&mut self) {
        self.position = self.live_position();
    }

    fn clamp(&self, d: Duration) -> Duration {
        if self.duration > Duration::ZERO {
            d.min(self.duration)
        } else {
            d
        }
    }
}
