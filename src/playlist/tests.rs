use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::PlayerError;
use crate::track::Track;

use super::controller::{FILL_LOW_WATER, Playlist, QueueState, SuggestionProvider};

fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track::local(Path::new(&format!("/music/{i:02}.mp3"))))
        .collect()
}

#[test]
fn empty_queue_has_no_playlist() {
    let mut p = Playlist::new(Vec::new());
    assert_eq!(p.state(), QueueState::NoPlaylist);
    assert_eq!(p.next(), None);
    assert_eq!(p.prev(), None);
}

#[test]
fn sequential_advance_stops_at_the_end() {
    let mut p = Playlist::new(tracks(3));
    assert_eq!(p.next(), Some(0));
    assert_eq!(p.next(), Some(1));
    assert_eq!(p.next(), Some(2));
    assert_eq!(p.state(), QueueState::Playing);

    // End of queue without repeat: stop, never wrap to 0.
    assert_eq!(p.next(), None);
    assert_eq!(p.state(), QueueState::Stopped);
    assert_eq!(p.current_index(), Some(2));
}

#[test]
fn repeat_wraps_at_both_ends() {
    let mut p = Playlist::new(tracks(3));
    p.set_repeat(true);
    p.select(2);
    assert_eq!(p.next(), Some(0));

    p.select(0);
    assert_eq!(p.prev(), Some(2));
}

#[test]
fn prev_at_start_without_repeat_does_nothing() {
    let mut p = Playlist::new(tracks(3));
    p.select(0);
    p.mark_playing();
    assert_eq!(p.prev(), None);
    // Not a stop condition, unlike running off the end.
    assert_eq!(p.state(), QueueState::Playing);
}

#[test]
fn random_pick_excludes_current() {
    let mut p = Playlist::new(tracks(4));
    p.set_random(true);
    p.select(2);
    for _ in 0..200 {
        let i = p.next().unwrap();
        assert!(i < 4);
        p.select(2);
    }
    // With only the excluded index possible, a wrong pick would have shown
    // up in 200 rounds.
    p.select(0);
    let picks: Vec<usize> = (0..200)
        .map(|_| {
            let i = p.next().unwrap();
            p.select(0);
            i
        })
        .collect();
    assert!(!picks.contains(&0));
}

#[test]
fn random_single_track_queue_can_repick_itself() {
    let mut p = Playlist::new(tracks(1));
    p.set_random(true);
    assert_eq!(p.next(), Some(0));
    assert_eq!(p.next(), Some(0));
}

#[test]
fn stop_after_fires_once_and_clears() {
    let mut p = Playlist::new(tracks(3));
    assert_eq!(p.next(), Some(0));
    p.set_stop_after(Some(1));

    assert_eq!(p.next(), Some(1));
    // The marked track just finished: stop here.
    assert_eq!(p.next(), None);
    assert_eq!(p.state(), QueueState::Stopped);

    // Marker is cleared; advancing again proceeds normally.
    assert_eq!(p.next(), Some(2));
}

#[test]
fn dynamic_requires_a_provider() {
    let mut p = Playlist::new(tracks(2));
    assert!(matches!(
        p.set_dynamic(true),
        Err(PlayerError::UnsupportedOperation(_))
    ));
    assert!(p.set_dynamic(false).is_ok());
}

struct CannedProvider;

impl SuggestionProvider for CannedProvider {
    fn suggest(&self, seed: &Track, count: usize) -> Vec<Track> {
        (0..count)
            .map(|i| {
                let mut t = Track::local(Path::new(&format!("/suggested/{i}.mp3")));
                t.artist = seed.artist.clone();
                t
            })
            .collect()
    }
}

#[test]
fn low_queue_triggers_dynamic_fill() {
    let mut seed = tracks(2);
    seed[0].artist = Some("Seed Artist".into());
    let mut p = Playlist::new(seed);
    p.set_provider(Arc::new(CannedProvider));
    p.set_dynamic(true).unwrap();

    assert_eq!(p.next(), Some(0));

    // The fill runs on a detached thread; poll until it lands.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut added = 0;
    while added == 0 && Instant::now() < deadline {
        added = p.poll_fill();
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(added, FILL_LOW_WATER);
    assert_eq!(p.len(), 2 + FILL_LOW_WATER);
    assert_eq!(
        p.track_mut(2).unwrap().artist.as_deref(),
        Some("Seed Artist")
    );
}

#[test]
fn full_queue_does_not_request_fill() {
    let mut p = Playlist::new(tracks(FILL_LOW_WATER + 1));
    p.set_provider(Arc::new(CannedProvider));
    p.set_dynamic(true).unwrap();

    assert_eq!(p.next(), Some(0));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(p.poll_fill(), 0);
    assert_eq!(p.len(), FILL_LOW_WATER + 1);
}
