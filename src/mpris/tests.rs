use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};

use zvariant::OwnedValue;

use crate::track::PlaybackState;

use super::*;

#[test]
fn caps_constant_is_everything_but_repeat_one() {
    assert_eq!(PLAYER_CAPS, 127);
}

#[test]
fn status_tuple_mapping() {
    assert_eq!(
        status_tuple(Some(PlaybackState::Playing), false, false),
        (0, 0, 0, 0)
    );
    assert_eq!(
        status_tuple(Some(PlaybackState::Paused), false, false),
        (1, 0, 0, 0)
    );
    assert_eq!(
        status_tuple(Some(PlaybackState::Stopped), false, false),
        (2, 0, 0, 0)
    );
    assert_eq!(status_tuple(None, false, false), (2, 0, 0, 0));
    assert_eq!(
        status_tuple(Some(PlaybackState::Playing), true, true),
        (0, 1, 0, 1)
    );
}

#[test]
fn metadata_map_contents() {
    let meta = TrackMeta {
        title: Some("Night Drive".into()),
        artist: Some("Some Band".into()),
        album: None,
        genre: Some("Electronic".into()),
        location: "/music/song.mp3".into(),
        length_secs: Some(180),
        bitrate_kbps: Some(192),
        track_no: 3,
        rating: 4,
    };
    let map = metadata_map(&meta);

    let get_str = |k: &str| map.get(k).and_then(|v| String::try_from(v.clone()).ok());
    let get_i32 = |k: &str| map.get(k).and_then(|v| i32::try_from(v.clone()).ok());

    assert_eq!(get_str("title").as_deref(), Some("Night Drive"));
    assert_eq!(get_str("artist").as_deref(), Some("Some Band"));
    assert!(!map.contains_key("album"));
    assert_eq!(get_str("genre").as_deref(), Some("Electronic"));
    assert_eq!(get_str("location").as_deref(), Some("/music/song.mp3"));
    assert_eq!(get_i32("time"), Some(180));
    assert_eq!(get_i32("audio-bitrate"), Some(192));
    assert_eq!(get_i32("tracknumber"), Some(3));
    assert_eq!(get_i32("rating"), Some(4));
}

#[test]
fn metadata_map_omits_unknowns() {
    let meta = TrackMeta {
        location: "http://radio.example/live".into(),
        track_no: -1,
        ..TrackMeta::default()
    };
    let map = metadata_map(&meta);
    assert!(map.contains_key("location"));
    assert!(!map.contains_key("time"));
    assert!(!map.contains_key("tracknumber"));
    assert!(!map.contains_key("audio-bitrate"));
    // Unrated tracks carry no rating entry.
    assert!(!map.contains_key("rating"));
}

#[test]
fn volume_and_position_bounds() {
    assert!(volume_in_range(0));
    assert!(volume_in_range(100));
    assert!(!volume_in_range(-1));
    assert!(!volume_in_range(101));

    assert!(position_acceptable(0, Some(180_000)));
    assert!(position_acceptable(180_000, Some(180_000)));
    assert!(!position_acceptable(180_001, Some(180_000)));
    assert!(!position_acceptable(-1, Some(180_000)));
    // Streams have no length; any forward position is accepted.
    assert!(position_acceptable(10_000_000, None));
    assert!(!position_acceptable(-1, None));
}

fn handle_for_test() -> (MprisHandle, Arc<Mutex<SharedState>>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (sig_tx, _sig_rx) = channel();
    (
        MprisHandle {
            state: state.clone(),
            signals: sig_tx,
        },
        state,
    )
}

#[test]
fn handle_updates_snapshot() {
    let (handle, state) = handle_for_test();

    handle.set_playback(Some(PlaybackState::Playing));
    handle.set_modes(true, false);
    handle.set_volume_pct(150);
    handle.set_position_ms(42_000);
    handle.set_track(Some(TrackMeta {
        title: Some("Night Drive".into()),
        length_secs: Some(180),
        location: "/music/song.mp3".into(),
        track_no: -1,
        ..TrackMeta::default()
    }));

    let s = state.lock().unwrap();
    assert_eq!(s.playback, Some(PlaybackState::Playing));
    assert!(s.random);
    assert!(!s.repeat);
    // Percentage is clamped on the way in.
    assert_eq!(s.volume_pct, 100);
    assert_eq!(s.position_ms, 42_000);
    assert_eq!(s.length_ms, Some(180_000));
    assert_eq!(
        s.meta.as_ref().and_then(|m| m.title.as_deref()),
        Some("Night Drive")
    );
}

#[test]
fn player_iface_commands_map_to_control_cmds() {
    let (tx, rx) = channel();
    let state = Arc::new(Mutex::new(SharedState::default()));
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    iface.next();
    iface.prev();
    iface.pause();
    iface.stop();
    iface.play();
    iface.repeat(true);
    iface.volume_set(70);
    iface.volume_set(250); // ignored
    state.lock().unwrap().length_ms = Some(180_000);
    iface.position_set(90_000);
    iface.position_set(999_999); // ignored

    let received: Vec<ControlCmd> = rx.try_iter().collect();
    assert_eq!(
        received,
        vec![
            ControlCmd::Next,
            ControlCmd::Prev,
            ControlCmd::Pause,
            ControlCmd::Stop,
            ControlCmd::Play,
            ControlCmd::SetVolume(70),
            ControlCmd::SetPosition(90_000),
        ]
    );
}

#[test]
fn status_and_metadata_reads_go_through_the_snapshot() {
    let (tx, _rx) = channel();
    let state = Arc::new(Mutex::new(SharedState::default()));
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    assert_eq!(iface.get_status(), (2, 0, 0, 0));
    assert!(iface.get_metadata().is_empty());
    assert_eq!(iface.get_caps(), 127);

    {
        let mut s = state.lock().unwrap();
        s.playback = Some(PlaybackState::Paused);
        s.repeat = true;
        s.volume_pct = 55;
        s.position_ms = 1234;
        s.meta = Some(TrackMeta {
            title: Some("Now".into()),
            location: "x".into(),
            track_no: -1,
            ..TrackMeta::default()
        });
    }

    assert_eq!(iface.get_status(), (1, 0, 0, 1));
    assert_eq!(iface.volume_get(), 55);
    assert_eq!(iface.position_get(), 1234);
    let map = iface.get_metadata();
    assert!(map.contains_key("title"));
    let _: &OwnedValue = map.get("title").unwrap();
}
