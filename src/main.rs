//! Headless demo player: scan a directory, queue everything and play it
//! through, logging engine events. `rondo <dir>` (defaults to `Music`).

use std::{env, path::Path, thread, time::Duration};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rondo::{PlaybackState, Player, PlaylistView, RodioBackend, Settings, scan};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    settings.validate()?;

    let dir = env::args().nth(1).unwrap_or("Music".to_string());
    let tracks = scan(Path::new(&dir), &settings.library);
    if tracks.is_empty() {
        error!("no playable tracks under {dir}");
        return Ok(());
    }
    info!(count = tracks.len(), "scanned library");

    let backend = RodioBackend::new()?;
    let player = Player::new(Box::new(backend), &settings.engine);

    let playlist = PlaylistView::new(tracks.clone(), settings.playback.loop_playlist);
    player.set_playlist(playlist.into_handle());

    player.on_song_changed(|t| info!(track = %t.display, "now playing"));
    player.on_finished(|t| info!(track = %t.display, "finished"));
    player.on_error(|e| error!("playback error: {e}"));

    if !player.play(Some(&tracks[0])) {
        error!("could not start playback");
        return Ok(());
    }

    // Host loop: drain the backend's end-of-track notifications until
    // the playlist runs out.
    loop {
        player.tick();
        if player.get_state() == PlaybackState::Stopped {
            break;
        }
        thread::sleep(Duration::from_millis(200));
    }

    Ok(())
}
