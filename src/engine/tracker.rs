//! Background position tracker.
//!
//! One tracker thread samples elapsed time and watches for natural
//! end-of-track while the engine is `Playing`. Cancellation is
//! cooperative: an atomic flag checked once per sampling iteration, plus
//! a bounded join, so shutdown never blocks on a tracker that refuses to
//! stop in time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::warn;

use crate::engine::player::{Shared, TrackerPass};

/// How long `cancel_and_join` waits before detaching the thread.
const JOIN_GRACE: Duration = Duration::from_millis(500);

pub(crate) struct PositionTracker {
    cancel: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl PositionTracker {
    pub fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();

        // Counted from the spawning thread so the invariant is observable
        // immediately, decremented by the guard when the thread exits.
        shared.live_trackers.fetch_add(1, Ordering::SeqCst);
        let join = thread::spawn(move || {
            let _live = LiveGuard(shared.clone());
            loop {
                thread::sleep(interval);
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                match shared.tracker_pass() {
                    TrackerPass::Continue => {}
                    TrackerPass::Exit => break,
                }
            }
        });

        Self { cancel, join }
    }

    /// Whether the thread already exited on its own (it self-terminates
    /// when the engine leaves `Playing`).
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Flag the thread to stop and wait a bounded amount of time for it.
    /// Best effort: if it does not finish within the grace period it is
    /// detached and left to run out its current sleep.
    pub fn cancel_and_join(self) {
        self.cancel.store(true, Ordering::Relaxed);

        let poll = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while waited < JOIN_GRACE {
            if self.join.is_finished() {
                let _ = self.join.join();
                return;
            }
            thread::sleep(poll);
            waited += poll;
        }
        warn!("position tracker did not stop within {JOIN_GRACE:?}, detaching");
    }
}

struct LiveGuard(Arc<Shared>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live_trackers.fetch_sub(1, Ordering::SeqCst);
    }
}
