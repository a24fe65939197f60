use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{EngineEvent, PlaybackEngine, SessionId};
use crate::mpris::{ControlCmd, MprisHandle, TrackMeta};
use crate::playlist::Playlist;
use crate::scrobble::{Notice, Scrobbler};
use crate::track::{PlaybackState, rating_stars};

/// Mutable loop state carried across ticks.
#[derive(Default)]
pub struct EventLoopState {
    /// Token of the bind the foreground currently cares about. Events with
    /// any other token are dropped.
    pub current_session: Option<SessionId>,
    pub last_meta: Option<TrackMeta>,
    pub last_status: Option<(Option<PlaybackState>, bool, bool)>,
    pub quit: bool,
}

pub fn run(
    playlist: &mut Playlist,
    engine: &PlaybackEngine,
    scrobbler: &Scrobbler,
    mpris: &MprisHandle,
    control_rx: &Receiver<ControlCmd>,
    engine_events: &Receiver<(SessionId, EngineEvent)>,
    notice_rx: &Receiver<Notice>,
    notices: &Sender<Notice>,
    state: &mut EventLoopState,
) {
    while !state.quit {
        while let Ok(cmd) = control_rx.try_recv() {
            handle_control(cmd, playlist, engine, scrobbler, state);
            if state.quit {
                break;
            }
        }

        while let Ok((session, event)) = engine_events.try_recv() {
            dispatch_engine_event(session, event, playlist, engine, scrobbler, notices, state);
        }

        while let Ok(notice) = notice_rx.try_recv() {
            info!("{}", notice.0);
        }

        playlist.poll_fill();
        super::mpris_sync::update_mpris(mpris, playlist, engine, state);
        thread::sleep(Duration::from_millis(50));
    }
}

fn handle_control(
    cmd: ControlCmd,
    playlist: &mut Playlist,
    engine: &PlaybackEngine,
    scrobbler: &Scrobbler,
    state: &mut EventLoopState,
) {
    match cmd {
        ControlCmd::Play => match playlist.current().map(|t| t.state()) {
            Some(PlaybackState::Paused) => {
                if let Some(track) = playlist.current_mut() {
                    if let Err(e) = track.play(engine) {
                        warn!("resume failed: {e}");
                    } else {
                        playlist.mark_playing();
                    }
                }
            }
            Some(PlaybackState::Playing) => {
                // Play while playing restarts the current track.
                stop_current(playlist, engine, scrobbler, state, false);
                start_playback(playlist, engine, state);
            }
            _ => {
                if playlist.current_index().is_none() && playlist.next().is_none() {
                    return;
                }
                start_playback(playlist, engine, state);
            }
        },

        ControlCmd::Pause => {
            if let Some(track) = playlist.current_mut() {
                track.pause(engine);
                // Pausing a stream is a stop; keep the session gate in step.
                state.current_session = track.session();
                match track.state() {
                    PlaybackState::Playing => playlist.mark_playing(),
                    PlaybackState::Stopped => playlist.mark_stopped(),
                    PlaybackState::Paused => {}
                }
            }
        }

        ControlCmd::Stop => {
            stop_current(playlist, engine, scrobbler, state, true);
        }

        ControlCmd::Next => {
            stop_current(playlist, engine, scrobbler, state, true);
            if playlist.next().is_some() {
                start_playback(playlist, engine, state);
            }
        }

        ControlCmd::Prev => {
            stop_current(playlist, engine, scrobbler, state, true);
            if playlist.prev().is_some() {
                start_playback(playlist, engine, state);
            }
        }

        ControlCmd::SetVolume(pct) => {
            engine.set_volume(pct as f32 / 100.0);
        }

        ControlCmd::SetPosition(ms) => {
            if let Some(track) = playlist.current_mut() {
                if let Err(e) = track.seek(engine, ms / 1000) {
                    warn!("seek rejected: {e}");
                }
            }
        }

        ControlCmd::Quit => {
            stop_current(playlist, engine, scrobbler, state, true);
            state.quit = true;
        }
    }
}

/// Apply one engine event if its session token is still current.
///
/// The old bind's token goes stale before a new source is bound, so a
/// late event can never mutate the track that replaced its sender.
/// Returns whether the event was applied.
pub(super) fn dispatch_engine_event(
    session: SessionId,
    event: EngineEvent,
    playlist: &mut Playlist,
    engine: &PlaybackEngine,
    scrobbler: &Scrobbler,
    notices: &Sender<Notice>,
    state: &mut EventLoopState,
) -> bool {
    if state.current_session != Some(session) {
        debug!(?session, "dropping event from stale session");
        return false;
    }
    handle_engine_event(event, playlist, engine, scrobbler, notices, state);
    true
}

fn handle_engine_event(
    event: EngineEvent,
    playlist: &mut Playlist,
    engine: &PlaybackEngine,
    scrobbler: &Scrobbler,
    notices: &Sender<Notice>,
    state: &mut EventLoopState,
) {
    match event {
        EngineEvent::TagsFound(found) => {
            if let Some(track) = playlist.current_mut() {
                track.apply_engine_tags(&found);
            }
        }

        EngineEvent::EndOfStream => {
            if let Some(track) = playlist.current_mut() {
                scrobbler.submit(track);
                track.finished();
            }
            state.current_session = None;
            if playlist.next().is_some() {
                start_playback(playlist, engine, state);
            } else {
                playlist.mark_stopped();
            }
        }

        EngineEvent::Buffering(pct) => {
            debug!(pct, "buffering");
        }

        EngineEvent::Error(msg) => {
            warn!("playback error: {msg}");
            let _ = notices.send(Notice(format!("Playback error: {msg}")));
            if let Some(track) = playlist.current_mut() {
                track.finished();
            }
            playlist.mark_stopped();
            state.current_session = None;
        }
    }
}

/// Play the current playlist entry and refresh the session gate.
fn start_playback(playlist: &mut Playlist, engine: &PlaybackEngine, state: &mut EventLoopState) {
    let Some(track) = playlist.current_mut() else {
        return;
    };
    if let Err(e) = track.ensure_tags() {
        // A track we cannot tag-read may still play.
        warn!("tag read failed for {}: {e}", track.location);
    }
    match track.play(engine) {
        Ok(()) => {
            let stars = rating_stars(track.rating);
            if stars.is_empty() {
                info!("playing {}", track.display_title());
            } else {
                info!("playing {} [{}]", track.display_title(), stars.trim_end());
            }
            state.current_session = track.session();
            playlist.mark_playing();
        }
        Err(e) => {
            warn!("cannot play {}: {e}", track.location);
            playlist.mark_stopped();
            state.current_session = None;
        }
    }
}

/// Stop the current track, optionally submitting it first.
fn stop_current(
    playlist: &mut Playlist,
    engine: &PlaybackEngine,
    scrobbler: &Scrobbler,
    state: &mut EventLoopState,
    scrobble: bool,
) {
    if let Some(track) = playlist.current_mut() {
        if scrobble && track.state() != PlaybackState::Stopped {
            scrobbler.submit(track);
        }
        track.stop(engine);
    }
    playlist.mark_stopped();
    state.current_session = None;
}
