use tracing::warn;

use crate::config::Settings;
use crate::engine::PlaybackEngine;
use crate::playlist::Playlist;

/// Push configured playback defaults into the queue and the engine.
pub fn apply_playback_defaults(
    playlist: &mut Playlist,
    engine: &PlaybackEngine,
    settings: &Settings,
) {
    playlist.set_random(settings.playback.shuffle);
    playlist.set_repeat(settings.playback.repeat);
    if settings.playback.dynamic {
        // No provider is registered at startup; the setting only takes
        // effect once one is plugged in.
        if let Err(e) = playlist.set_dynamic(true) {
            warn!("dynamic playback not enabled: {e}");
        }
    }
    engine.set_volume(settings.player.volume);
}
