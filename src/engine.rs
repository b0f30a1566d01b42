//! The playback engine.
//!
//! Owns the lifecycle state machine, the background position tracker,
//! the auto-advance/auto-skip policies and event notification. Hosts
//! drive it through [`Player`] and must pump [`Player::tick`] from
//! their main loop.

mod events;
mod player;
mod recovery;
mod state;
mod tracker;


pub use player::Player;
pub use state::PlaybackState;
