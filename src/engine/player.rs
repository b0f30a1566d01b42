//! The playback engine: lifecycle operations, auto-advance and the
//! idempotent finished handler.
//!
//! All state lives behind one mutex. Operations queue events while the
//! lock is held and dispatch them after it is released, so subscriber
//! code never runs under the engine lock. Lock order is engine state
//! first, playlist second; never the reverse.

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::backend::MediaBackend;
use crate::config::EngineSettings;
use crate::engine::events::{Callbacks, EngineEvent};
use crate::engine::recovery::FailureLog;
use crate::engine::state::{EngineState, PlaybackState};
use crate::engine::tracker::PositionTracker;
use crate::error::PlayerError;
use crate::library::Track;
use crate::playlist::PlaylistHandle;

/// What the tracker thread should do after one sampling pass.
pub(crate) enum TrackerPass {
    Continue,
    Exit,
}

pub(crate) struct Inner {
    pub state: EngineState,
    backend: Box<dyn MediaBackend>,
    playlist: Option<PlaylistHandle>,
    failures: FailureLog,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    callbacks: Mutex<Callbacks>,
    pub(crate) live_trackers: AtomicUsize,
}

/// The playback engine.
///
/// Host-facing operations return `bool`; failures surface as error
/// events, never as panics or `Err` values. The host must call
/// [`tick`](Player::tick) periodically to drain the backend's own
/// end-of-track notification.
pub struct Player {
    shared: Arc<Shared>,
    tracker: Mutex<Option<PositionTracker>>,
    sample_interval: Duration,
}

impl Player {
    pub fn new(backend: Box<dyn MediaBackend>, settings: &EngineSettings) -> Self {
        let mut backend = backend;
        let state = EngineState::new(settings.volume, settings.auto_advance);
        backend.set_volume(state.volume);

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    backend,
                    playlist: None,
                    failures: FailureLog::new(settings.failure_warn_threshold),
                }),
                callbacks: Mutex::new(Callbacks::default()),
                live_trackers: AtomicUsize::new(0),
            }),
            tracker: Mutex::new(None),
            sample_interval: Duration::from_millis(settings.tick_interval_ms.max(1)),
        }
    }

    /// Start playback.
    ///
    /// With a track: load and play it. Without one: resume when paused,
    /// restart the previously loaded track when stopped, no-op when
    /// already playing. Returns `false` when there is nothing to play or
    /// nothing could be started.
    pub fn play(&self, track: Option<&Track>) -> bool {
        let (ok, events) = {
            let mut inner = self.shared.inner.lock().unwrap();
            let mut events = Vec::new();
            let ok = match track {
                Some(t) => start_with_recovery(&mut inner, t.clone(), &mut events),
                None => match inner.state.lifecycle {
                    PlaybackState::Paused => {
                        resume(&mut inner, &mut events);
                        true
                    }
                    PlaybackState::Playing => true,
                    _ => match inner.state.current.clone() {
                        Some(t) => start_with_recovery(&mut inner, t, &mut events),
                        None => false,
                    },
                },
            };
            (ok, events)
        };
        self.shared.dispatch(events);
        self.sync_tracker();
        ok
    }

    /// Pause playback. Valid only from `Playing`.
    pub fn pause(&self) -> bool {
        let (ok, events) = {
            let mut inner = self.shared.inner.lock().unwrap();
            let mut events = Vec::new();
            let ok = if inner.state.lifecycle == PlaybackState::Playing {
                if let Some(started) = inner.state.started_at.take() {
                    inner.state.accumulated += started.elapsed();
                }
                inner.state.sample_position();
                inner.backend.pause();
                inner.state.set_lifecycle(PlaybackState::Paused, &mut events);
                true
            } else {
                false
            };
            (ok, events)
        };
        self.shared.dispatch(events);
        self.sync_tracker();
        ok
    }

    /// Stop playback and reset the position. Calling `stop` while already
    /// stopped is a no-op success.
    pub fn stop(&self) -> bool {
        let events = {
            let mut inner = self.shared.inner.lock().unwrap();
            let mut events = Vec::new();
            if inner.state.lifecycle != PlaybackState::Stopped {
                settle_stopped(&mut inner, &mut events);
            }
            events
        };
        self.shared.dispatch(events);
        self.sync_tracker();
        true
    }

    /// Advance the playlist cursor and play the track there.
    pub fn next(&self) -> bool {
        self.navigate(true)
    }

    /// Move the playlist cursor back and play the track there.
    pub fn previous(&self) -> bool {
        self.navigate(false)
    }

    fn navigate(&self, forward: bool) -> bool {
        let (ok, events) = {
            let mut inner = self.shared.inner.lock().unwrap();
            let mut events = Vec::new();
            let ok = match inner.playlist.clone() {
                Some(handle) => {
                    let stepped = {
                        let mut playlist = handle.lock().unwrap();
                        if forward {
                            playlist.advance()
                        } else {
                            playlist.retreat()
                        }
                    };
                    match stepped {
                        Some(t) => start_with_recovery(&mut inner, t, &mut events),
                        None => {
                            debug!("navigation failed: {}", PlayerError::PlaylistExhausted);
                            false
                        }
                    }
                }
                None => false,
            };
            (ok, events)
        };
        self.shared.dispatch(events);
        self.sync_tracker();
        ok
    }

    /// Set the volume, clamped into `[0, 1]`. Never changes the
    /// lifecycle state.
    pub fn set_volume(&self, volume: f32) -> bool {
        let mut inner = self.shared.inner.lock().unwrap();
        let volume = volume.clamp(0.0, 1.0);
        inner.state.volume = volume;
        inner.backend.set_volume(volume);
        true
    }

    /// Seeking is not supported by the audio backend; this always fails
    /// and callers must not treat that as a bug.
    pub fn seek(&self, _position: Duration) -> bool {
        false
    }

    pub fn get_state(&self) -> PlaybackState {
        self.shared.inner.lock().unwrap().state.lifecycle
    }

    pub fn get_position(&self) -> Duration {
        self.shared.inner.lock().unwrap().state.live_position()
    }

    pub fn get_duration(&self) -> Duration {
        self.shared.inner.lock().unwrap().state.duration
    }

    pub fn get_current_track(&self) -> Option<Track> {
        self.shared.inner.lock().unwrap().state.current.clone()
    }

    pub fn get_volume(&self) -> f32 {
        self.shared.inner.lock().unwrap().state.volume
    }

    /// Attach the playlist the engine navigates over. The handle stays
    /// shared: other owners may mutate the playlist between calls.
    pub fn set_playlist(&self, playlist: PlaylistHandle) {
        self.shared.inner.lock().unwrap().playlist = Some(playlist);
    }

    pub fn set_auto_advance(&self, enabled: bool) {
        self.shared.inner.lock().unwrap().state.auto_advance = enabled;
    }

    pub fn is_auto_advance_enabled(&self) -> bool {
        self.shared.inner.lock().unwrap().state.auto_advance
    }

    /// Register the state-changed subscriber, replacing any previous one.
    pub fn on_state_changed(&self, cb: impl Fn(PlaybackState) + Send + 'static) {
        self.shared.callbacks.lock().unwrap().state_changed = Some(Box::new(cb));
    }

    /// Register the song-changed subscriber, replacing any previous one.
    pub fn on_song_changed(&self, cb: impl Fn(&Track) + Send + 'static) {
        self.shared.callbacks.lock().unwrap().song_changed = Some(Box::new(cb));
    }

    /// Register the finished subscriber, replacing any previous one.
    pub fn on_finished(&self, cb: impl Fn(&Track) + Send + 'static) {
        self.shared.callbacks.lock().unwrap().finished = Some(Box::new(cb));
    }

    /// Register the error subscriber, replacing any previous one.
    pub fn on_error(&self, cb: impl Fn(&PlayerError) + Send + 'static) {
        self.shared.callbacks.lock().unwrap().error = Some(Box::new(cb));
    }

    /// Drain the backend's native end-of-track notification. The host
    /// loop must call this periodically; it is one of two detectors
    /// racing toward the same guarded finished handler.
    pub fn tick(&self) {
        let events = {
            let mut inner = self.shared.inner.lock().unwrap();
            if inner.backend.poll_finished() && inner.state.lifecycle == PlaybackState::Playing {
                finish_current(&mut inner)
            } else {
                Vec::new()
            }
        };
        self.shared.dispatch(events);
        self.sync_tracker();
    }

    /// Keep the tracker thread in step with the lifecycle: a live tracker
    /// iff the engine is `Playing`, and never more than one. A previous
    /// tracker is cancelled and joined before a new one starts.
    fn sync_tracker(&self) {
        let playing =
            self.shared.inner.lock().unwrap().state.lifecycle == PlaybackState::Playing;
        let mut slot = self.tracker.lock().unwrap();
        if playing {
            if slot.as_ref().is_some_and(|t| !t.is_finished()) {
                return;
            }
            if let Some(old) = slot.take() {
                old.cancel_and_join();
            }
            *slot = Some(PositionTracker::spawn(
                self.shared.clone(),
                self.sample_interval,
            ));
        } else if let Some(old) = slot.take() {
            old.cancel_and_join();
        }
    }

    #[cfg(test)]
    pub(crate) fn live_trackers(&self) -> usize {
        self.shared
            .live_trackers
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.tracker.lock() {
            if let Some(t) = slot.take() {
                t.cancel_and_join();
            }
        }
    }
}

impl Shared {
    fn dispatch(&self, events: Vec<EngineEvent>) {
        if events.is_empty() {
            return;
        }
        let callbacks = self.callbacks.lock().unwrap();
        for event in &events {
            callbacks.dispatch(event);
        }
    }

    /// One tracker iteration: sample the position, or run the finished
    /// handler when the backend drained while we still believe we are
    /// `Playing`. Runs under the state mutex, so whichever detector gets
    /// here second finds the state already changed and no-ops.
    pub(crate) fn tracker_pass(&self) -> TrackerPass {
        let (pass, events) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state.lifecycle != PlaybackState::Playing {
                (TrackerPass::Exit, Vec::new())
            } else if !inner.backend.is_busy() {
                let events = finish_current(&mut inner);
                let pass = if inner.state.lifecycle == PlaybackState::Playing {
                    TrackerPass::Continue
                } else {
                    TrackerPass::Exit
                };
                (pass, events)
            } else {
                inner.state.sample_position();
                (TrackerPass::Continue, Vec::new())
            }
        };
        self.dispatch(events);
        pass
    }
}

/// Resume from `Paused` through unpause: the loaded track is reused,
/// never reloaded.
fn resume(inner: &mut Inner, events: &mut Vec<EngineEvent>) {
    inner.backend.unpause();
    inner.state.started_at = Some(Instant::now());
    inner.state.set_lifecycle(PlaybackState::Playing, events);
}

/// Load and start one track. On failure the engine is forced to
/// `Stopped` and the error is returned for the caller to surface.
fn start_track(
    inner: &mut Inner,
    track: &Track,
    events: &mut Vec<EngineEvent>,
) -> Result<(), PlayerError> {
    inner.state.set_lifecycle(PlaybackState::Loading, events);

    let loaded = if track.is_present() {
        inner.backend.load(&track.path)
    } else {
        Err(PlayerError::MediaNotFound(track.path.clone()))
    };

    match loaded {
        Ok(()) => {
            let probed = inner
                .backend
                .probe_duration(&track.path)
                .or(track.duration)
                .unwrap_or(Duration::ZERO);
            let changed = inner
                .state
                .current
                .as_ref()
                .is_none_or(|c| c.path != track.path);

            inner.state.current = Some(track.clone());
            inner.state.duration = probed;
            inner.state.position = Duration::ZERO;
            inner.state.accumulated = Duration::ZERO;
            inner.state.started_at = Some(Instant::now());
            inner.backend.play();
            inner.state.set_lifecycle(PlaybackState::Playing, events);
            if changed {
                events.push(EngineEvent::SongChanged(track.clone()));
            }
            info!(track = %track.display, "playing");
            Ok(())
        }
        Err(e) => {
            inner.backend.stop();
            inner.state.started_at = None;
            inner.state.accumulated = Duration::ZERO;
            inner.state.position = Duration::ZERO;
            inner.state.set_lifecycle(PlaybackState::Stopped, events);
            Err(e)
        }
    }
}

/// Start `first`, skipping forward on failure while auto-advance is on.
/// Each failure emits one error event; the chain is bounded by the
/// playlist length so a fully broken looping playlist cannot retry
/// forever. A failed playlist advance ends recovery silently.
fn start_with_recovery(inner: &mut Inner, first: Track, events: &mut Vec<EngineEvent>) -> bool {
    let mut track = first;
    let mut remaining = inner
        .playlist
        .as_ref()
        .map(|p| p.lock().unwrap().tracks.len().max(1))
        .unwrap_or(1);

    loop {
        match start_track(inner, &track, events) {
            Ok(()) => return true,
            Err(e) => {
                inner.failures.note(&track);
                events.push(EngineEvent::Error(e));

                remaining -= 1;
                if !inner.state.auto_advance || remaining == 0 {
                    return false;
                }
                match inner.playlist.as_ref().and_then(|p| p.lock().unwrap().advance()) {
                    Some(t) => track = t,
                    None => {
                        debug!("recovery stopped: {}", PlayerError::PlaylistExhausted);
                        return false;
                    }
                }
            }
        }
    }
}

/// The single finished handler both detectors funnel into. Callers have
/// already verified, under the state mutex, that the engine is `Playing`.
fn finish_current(inner: &mut Inner) -> Vec<EngineEvent> {
    let mut events = Vec::new();

    let Some(done) = inner.state.current.clone() else {
        settle_stopped(inner, &mut events);
        return events;
    };
    info!(track = %done.display, "track finished");
    events.push(EngineEvent::Finished(done));

    if inner.state.auto_advance && inner.playlist.is_some() {
        match inner.playlist.as_ref().and_then(|p| p.lock().unwrap().advance()) {
            Some(t) => {
                start_with_recovery(inner, t, &mut events);
            }
            None => {
                debug!("auto-advance stopped: {}", PlayerError::PlaylistExhausted);
                settle_stopped(inner, &mut events);
            }
        }
    } else {
        settle_stopped(inner, &mut events);
    }
    events
}

fn settle_stopped(inner: &mut Inner, events: &mut Vec<EngineEvent>) {
    inner.backend.stop();
    inner.state.started_at = None;
    inner.state.accumulated = Duration::ZERO;
    inner.state.position = Duration::ZERO;
    inner.state.set_lifecycle(PlaybackState::Stopped, events);
}
