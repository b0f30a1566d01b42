//! Playlist view and navigation.
//!
//! The playlist is a shared, externally mutable resource: a playlist
//! manager or GUI may reorder or remove tracks between engine calls, so
//! every navigation revalidates the stored index instead of trusting it.

use std::sync::{Arc, Mutex};

use crate::library::Track;

/// An ordered, indexable list of tracks with a cursor and a loop flag.
#[derive(Debug, Default)]
pub struct PlaylistView {
    pub tracks: Vec<Track>,
    pub current: Option<usize>,
    pub looping: bool,
}

/// Shared handle to a playlist. The engine borrows this; it never owns
/// the playlist.
pub type PlaylistHandle = Arc<Mutex<PlaylistView>>;

impl PlaylistView {
    pub fn new(tracks: Vec<Track>, looping: bool) -> Self {
        let current = if tracks.is_empty() { None } else { Some(0) };
        Self {
            tracks,
            current,
            looping,
        }
    }

    pub fn into_handle(self) -> PlaylistHandle {
        Arc::new(Mutex::new(self))
    }

    /// Track under the cursor, if the cursor is still in bounds.
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Re-validate the cursor against the current track list. A concurrent
    /// removal can leave it past the end; clamp rather than fail so that
    /// navigation keeps working after external edits.
    fn revalidated(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current.map(|i| i.min(self.tracks.len() - 1))
    }

    /// Advance the cursor and return the track at the new index.
    ///
    /// Fails (returning `None`, cursor untouched) when the playlist is
    /// empty, no cursor is set, or the end is reached without looping.
    pub fn advance(&mut self) -> Option<Track> {
        let cur = self.revalidated()?;
        let candidate = cur + 1;
        let next = if candidate >= self.tracks.len() {
            if self.looping { 0 } else { return None }
        } else {
            candidate
        };
        self.current = Some(next);
        Some(self.tracks[next].clone())
    }

    /// Move the cursor back and return the track at the new index.
    /// Symmetric to [`advance`](Self::advance): wraps to the last index
    /// when looping, fails at the start otherwise.
    pub fn retreat(&mut self) -> Option<Track> {
        let cur = self.revalidated()?;
        let prev = if cur == 0 {
            if self.looping {
                self.tracks.len() - 1
            } else {
                return None;
            }
        } else {
            cur - 1
        };
        self.current = Some(prev);
        Some(self.tracks[prev].clone())
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

    fn playlist(names: &[&str], looping: bool) -> PlaylistView {
        PlaylistView::new(names.iter().map(|n| track(n)).collect(), looping)
    }

    #[test]
    fn advance_walks_forward_and_stops_at_the_end() {
        let mut p = playlist(&["a", "b", "c"], false);
        assert_eq!(p.advance().unwrap().title, "b");
        assert_eq!(p.advance().unwrap().title, "c");
        assert!(p.advance().is_none());
        // Failed advance does not move the cursor.
        assert_eq!(p.current, Some(2));
    }

    #[test]
    fn advance_wraps_when_looping() {
        let mut p = playlist(&["a", "b"], true);
        p.current = Some(1);
        assert_eq!(p.advance().unwrap().title, "a");
        assert_eq!(p.current, Some(0));
    }

    #[test]
    fn retreat_walks_back_and_stops_at_the_start() {
        let mut p = playlist(&["a", "b"], false);
        p.current = Some(1);
        assert_eq!(p.retreat().unwrap().title, "a");
        assert!(p.retreat().is_none());
        assert_eq!(p.current, Some(0));
    }

    #[test]
    fn retreat_wraps_to_last_when_looping() {
        let mut p = playlist(&["a", "b", "c"], true);
        assert_eq!(p.retreat().unwrap().title, "c");
        assert_eq!(p.current, Some(2));
    }

    #[test]
    fn empty_playlist_has_no_cursor_and_fails_navigation() {
        let mut p = playlist(&[], true);
        assert_eq!(p.current, None);
        assert!(p.advance().is_none());
        assert!(p.retreat().is_none());
    }

    #[test]
    fn navigation_without_a_cursor_fails() {
        let mut p = playlist(&["a", "b"], true);
        p.current = None;
        assert!(p.advance().is_none());
        assert!(p.retreat().is_none());
    }

    #[test]
    fn stale_cursor_is_clamped_after_external_removal() {
        let mut p = playlist(&["a", "b", "c"], false);
        p.current = Some(2);
        // Another owner removed the tail behind our back.
        p.tracks.truncate(2);
        // Clamped to index 1; no next track without looping.
        assert!(p.advance().is_none());
        assert_eq!(p.retreat().unwrap().title, "a");
    }
}
