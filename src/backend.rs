//! Audio backend capability and its `rodio` implementation.
//!
//! The engine talks to playback hardware only through [`MediaBackend`],
//! so tests can script a fake and the rodio plumbing stays in one place.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::file::AudioFile;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tracing::debug;

use crate::error::PlayerError;

/// The capability surface the engine needs from an audio device:
/// one decoding/output stream at a time, no seeking.
pub trait MediaBackend: Send {
    /// Decode `path` and prepare it for playback, replacing whatever was
    /// loaded before. Fails on missing or undecodable files.
    fn load(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn play(&mut self);
    fn pause(&mut self);
    fn unpause(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    /// Whether the device still has queued audio for the loaded track.
    fn is_busy(&self) -> bool;
    /// Probe a file's duration without loading it. `None` if unknown.
    fn probe_duration(&self, path: &Path) -> Option<Duration>;
    /// Drain the pending natural end-of-track notification, if any.
    /// At most one fires per loaded track.
    fn poll_finished(&mut self) -> bool;
}

/// Probe a media file's duration from its tags. `None` when the file
/// cannot be read as audio.
pub fn probe_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}

/// `MediaBackend` over a single rodio output stream and sink.
pub struct RodioBackend {
    stream: OutputStream,
    sink: Option<Sink>,
    volume: f32,
    /// A track is loaded and its completion has not been announced yet.
    armed: bool,
}

impl RodioBackend {
    /// Open the default audio output device. This is the only fatal
    /// failure in the crate: without a device the engine cannot exist.
    pub fn new() -> Result<Self, PlayerError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::BackendInit(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful
        // in debugging, but noisy for host applications.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            volume: 1.0,
            armed: false,
        })
    }
}

impl MediaBackend for RodioBackend {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.armed = false;

        let file = File::open(path).map_err(|_| PlayerError::MediaNotFound(path.to_path_buf()))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::MediaUnplayable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();

        debug!(path = %path.display(), "backend loaded track");
        self.sink = Some(sink);
        self.armed = true;
        Ok(())
    }

    fn play(&mut self) {
        if let Some(s) = &self.sink {
            s.play();
        }
    }

    fn pause(&mut self) {
        if let Some(s) = &self.sink {
            s.pause();
        }
    }

    fn unpause(&mut self) {
        if let Some(s) = &self.sink {
            s.play();
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.armed = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(s) = &self.sink {
            s.set_volume(volume);
        }
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
    }

    fn probe_duration(&self, path: &Path) -> Option<Duration> {
        probe_duration(path)
    }

    fn poll_finished(&mut self) -> bool {
        // A drained sink that was armed means the loaded track ran out
        // naturally; announce that exactly once.
        if self.armed && self.sink.as_ref().is_some_and(|s| s.empty()) {
            self.armed = false;
            return true;
        }
        false
    }
}
