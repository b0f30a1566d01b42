//! Per-track failure accounting for the auto-skip policy.
//!
//! Counters are ephemeral, engine-owned and keyed by file path; they are
//! never persisted. The count does not gate the skip itself (a skip is
//! always attempted), it only escalates the log severity once a track
//! keeps failing.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::library::Track;

pub(crate) struct FailureLog {
    counts: HashMap<PathBuf, u32>,
    warn_threshold: u32,
}

impl FailureLog {
    pub fn new(warn_threshold: u32) -> Self {
        Self {
            counts: HashMap::new(),
            warn_threshold: warn_threshold.max(1),
        }
    }

    /// Record one failure for `track` and return the running count.
    pub fn note(&mut self, track: &Track) -> u32 {
        let count = self.counts.entry(track.path.clone()).or_insert(0);
        *count += 1;
        if *count >= self.warn_threshold {
            warn!(
                track = %track.display,
                failures = *count,
                "track keeps failing to play, skipping again"
            );
        } else {
            debug!(track = %track.display, failures = *count, "track failed to play, skipping");
        }
        *count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn track(name: &str) -> Track {
        Track {
            path: PathBuf::from(format!("/music/{name}.mp3")),
            title: name.to_string(),
            artist: None,
            album: None,
            artwork: None,
            duration: None,
            display: name.to_string(),
        }
    }

    #[test]
    fn failures_are_counted_per_track() {
        let mut log = FailureLog::new(3);
        let a = track("a");
        let b = track("b");
        assert_eq!(log.note(&a), 1);
        assert_eq!(log.note(&a), 2);
        assert_eq!(log.note(&b), 1);
        assert_eq!(log.note(&a), 3);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let mut log = FailureLog::new(0);
        assert_eq!(log.note(&track("a")), 1);
    }
}
