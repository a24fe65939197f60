use crate::engine::PlaybackEngine;
use crate::mpris::{MprisHandle, TrackMeta};
use crate::playlist::Playlist;
use crate::track::{Length, Track};

use super::event_loop::EventLoopState;

fn track_meta(track: &Track) -> TrackMeta {
    TrackMeta {
        title: Some(track.display_title()),
        artist: track.artist.clone(),
        album: track.album.clone(),
        genre: track.genre.clone(),
        location: track.location.clone(),
        length_secs: match track.duration() {
            Length::Known(d) => Some(d.as_secs()),
            Length::Unknown => None,
        },
        bitrate_kbps: track.bitrate,
        track_no: track.track_no,
        rating: track.rating,
    }
}

/// Refresh the DBus snapshot and emit change signals where the visible
/// state moved since the last tick.
pub fn update_mpris(
    mpris: &MprisHandle,
    playlist: &Playlist,
    engine: &PlaybackEngine,
    state: &mut EventLoopState,
) {
    let current = playlist.current();
    let playback = current.map(|t| t.state());
    let meta = current.map(track_meta);

    mpris.set_playback(playback);
    mpris.set_modes(playlist.random(), playlist.repeat());
    mpris.set_volume_pct((engine.volume() * 100.0).round() as i32);
    mpris.set_position_ms(
        engine
            .position()
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0),
    );

    if meta != state.last_meta {
        mpris.set_track(meta.clone());
        if meta.is_some() {
            mpris.emit_track_change();
        }
        state.last_meta = meta;
    }

    let status = (playback, playlist.random(), playlist.repeat());
    if state.last_status != Some(status) {
        mpris.emit_status_change();
        state.last_status = Some(status);
    }
}
