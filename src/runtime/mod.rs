//! Headless runtime: wires the playlist, engine, scrobbler and DBus
//! remote control together and runs the control loop.

use std::env;
use std::path::Path;
use std::sync::mpsc;

use tracing::info;

use crate::config::Settings;
use crate::engine::PlaybackEngine;
use crate::library;
use crate::mpris::{self, ControlCmd};
use crate::playlist::Playlist;
use crate::scrobble::Scrobbler;
use crate::track::Track;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let tracks = collect_tracks(&settings);
    info!(count = tracks.len(), "loaded tracks");

    let (engine, engine_events) = PlaybackEngine::start();
    let (notice_tx, notice_rx) = mpsc::channel();
    let scrobbler = Scrobbler::new(&settings.scrobbler, notice_tx.clone());
    let mut playlist = Playlist::new(tracks);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = mpris::spawn_mpris(control_tx.clone());

    startup::apply_playback_defaults(&mut playlist, &engine, &settings);

    // Start playing as soon as there is something to play; an empty queue
    // just waits for DBus commands.
    if !playlist.is_empty() {
        let _ = control_tx.send(ControlCmd::Play);
    }

    let mut state = event_loop::EventLoopState::default();
    event_loop::run(
        &mut playlist,
        &engine,
        &scrobbler,
        &mpris,
        &control_rx,
        &engine_events,
        &notice_rx,
        &notice_tx,
        &mut state,
    );

    engine.quit();
    Ok(())
}

/// Build the initial queue from command-line arguments: directories are
/// scanned, files become local tracks, URLs become streams. No arguments
/// scans the current directory.
fn collect_tracks(settings: &Settings) -> Vec<Track> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return env::current_dir()
            .map(|dir| library::scan(&dir, &settings.library))
            .unwrap_or_default();
    }

    let mut tracks = Vec::new();
    for arg in args {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            tracks.push(Track::stream(&arg));
            continue;
        }
        let path = Path::new(&arg);
        if path.is_dir() {
            tracks.extend(library::scan(path, &settings.library));
        } else {
            tracks.push(Track::local(path));
        }
    }
    tracks
}
