//! Event notification with subscriber isolation.
//!
//! One subscriber slot per event kind. Dispatch wraps every subscriber
//! call in `catch_unwind`: a broken UI callback must never corrupt
//! playback state or abort an in-progress transition. Events are queued
//! under the state mutex and dispatched after it is released.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use crate::engine::state::PlaybackState;
use crate::error::PlayerError;
use crate::library::Track;

/// An engine event queued during an operation and dispatched afterwards.
#[derive(Debug)]
pub(crate) enum EngineEvent {
    StateChanged(PlaybackState),
    SongChanged(Track),
    Finished(Track),
    Error(PlayerError),
}

type StateCallback = Box<dyn Fn(PlaybackState) + Send>;
type TrackCallback = Box<dyn Fn(&Track) + Send>;
type ErrorCallback = Box<dyn Fn(&PlayerError) + Send>;

/// At most one subscriber per event kind; registering again replaces
/// the previous handler.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub state_changed: Option<StateCallback>,
    pub song_changed: Option<TrackCallback>,
    pub finished: Option<TrackCallback>,
    pub error: Option<ErrorCallback>,
}

impl Callbacks {
    pub fn dispatch(&self, event: &EngineEvent) {
        match event {
            EngineEvent::StateChanged(state) => {
                if let Some(cb) = &self.state_changed {
                    guarded("state-changed", || cb(*state));
                }
            }
            EngineEvent::SongChanged(track) => {
                if let Some(cb) = &self.song_changed {
                    guarded("song-changed", || cb(track));
                }
            }
            EngineEvent::Finished(track) => {
                if let Some(cb) = &self.finished {
                    guarded("finished", || cb(track));
                }
            }
            EngineEvent::Error(err) => {
                if let Some(cb) = &self.error {
                    guarded("error", || cb(err));
                }
            }
        }
    }
}

fn guarded(kind: &'static str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        warn!("{}", PlayerError::CallbackFailure(kind));
    }
}
