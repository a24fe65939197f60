use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::engine::{Pipeline, PipelineState, SessionId};
use crate::error::PlayerError;

use super::meta::{format_bitrate, parse_bitrate_field, parse_track_pair, rating_stars};
use super::model::{Length, PlaybackState, Track, TrackKind};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Bind(String),
    SetState(PipelineState),
    Seek(Duration),
}

/// Recording stand-in for the engine.
#[derive(Default)]
struct MockPipeline {
    calls: Mutex<Vec<Call>>,
    next_session: AtomicU64,
    position: Mutex<Option<Duration>>,
}

impl MockPipeline {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn bind_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Bind(_)))
            .count()
    }
}

impl Pipeline for MockPipeline {
    fn bind(&self, uri: &str) -> SessionId {
        self.calls.lock().unwrap().push(Call::Bind(uri.to_string()));
        SessionId(self.next_session.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn set_state(&self, state: PipelineState) {
        self.calls.lock().unwrap().push(Call::SetState(state));
    }

    fn seek(&self, pos: Duration) {
        self.calls.lock().unwrap().push(Call::Seek(pos));
    }

    fn position(&self) -> Option<Duration> {
        *self.position.lock().unwrap()
    }
}

#[test]
fn track_pair_parsing() {
    assert_eq!(parse_track_pair("3/12"), (3, 12));
    assert_eq!(parse_track_pair(" 7 / 10 "), (7, 10));
    assert_eq!(parse_track_pair("5"), (5, -1));
    assert_eq!(parse_track_pair("5/x"), (5, -1));
    assert_eq!(parse_track_pair("x/12"), (-1, -1));
    assert_eq!(parse_track_pair(""), (-1, -1));
    assert_eq!(parse_track_pair("-3/2"), (-1, -1));
}

#[test]
fn bitrate_and_rating_formatting() {
    assert_eq!(format_bitrate(Some(128)), "128k");
    assert_eq!(format_bitrate(None), "");

    assert_eq!(parse_bitrate_field("128"), Some(128));
    assert_eq!(parse_bitrate_field("128kbps"), Some(128));
    assert_eq!(parse_bitrate_field("128000"), Some(128));
    assert_eq!(parse_bitrate_field("0"), None);
    assert_eq!(parse_bitrate_field("fast"), None);

    assert_eq!(rating_stars(0), "");
    assert_eq!(rating_stars(3), "* * * ");
    assert_eq!(rating_stars(9), "* * * * * ");
}

#[test]
fn stream_constructor_defaults() {
    let t = Track::stream("http://radio.example/live");
    assert_eq!(t.kind, TrackKind::Stream);
    assert_eq!(
        t.title.as_deref(),
        Some("Stream: http://radio.example/live")
    );
    assert_eq!(t.album.as_deref(), Some("http://radio.example/live"));
    assert_eq!(t.duration(), Length::Unknown);
}

#[test]
fn play_binds_once_and_is_idempotent() {
    let pipeline = MockPipeline::default();
    let mut t = Track::local(Path::new("/music/song.mp3"));

    t.play(&pipeline).unwrap();
    assert!(t.is_playing());
    assert!(t.session().is_some());

    t.play(&pipeline).unwrap();
    assert_eq!(pipeline.bind_count(), 1);
    assert_eq!(pipeline.calls(), vec![Call::Bind("/music/song.mp3".into())]);
}

#[test]
fn pause_and_resume_local_track() {
    let pipeline = MockPipeline::default();
    let mut t = Track::local(Path::new("/music/song.mp3"));
    t.play(&pipeline).unwrap();

    t.pause(&pipeline);
    assert!(t.is_paused());
    t.pause(&pipeline);
    assert!(t.is_playing());

    assert_eq!(
        pipeline.calls(),
        vec![
            Call::Bind("/music/song.mp3".into()),
            Call::SetState(PipelineState::Paused),
            Call::SetState(PipelineState::Playing),
        ]
    );
    // Resume did not rebind.
    assert_eq!(pipeline.bind_count(), 1);
}

#[test]
fn pausing_a_stream_stops_it_and_resume_restarts() {
    let pipeline = MockPipeline::default();
    let mut t = Track::stream("http://radio.example/live");
    t.play(&pipeline).unwrap();

    t.pause(&pipeline);
    assert_eq!(t.state(), PlaybackState::Stopped);
    assert_eq!(t.session(), None);

    // Resuming goes through a fresh bind, i.e. position zero.
    t.play(&pipeline).unwrap();
    assert_eq!(pipeline.bind_count(), 2);
}

#[test]
fn podcast_location_swaps_on_play_and_restores_on_stop() {
    let pipeline = MockPipeline::default();
    let mut t = Track::podcast("http://feed.example/ep1.mp3", "/cache/ep1.mp3");

    t.play(&pipeline).unwrap();
    assert_eq!(t.location, "/cache/ep1.mp3");
    assert_eq!(pipeline.calls(), vec![Call::Bind("/cache/ep1.mp3".into())]);

    t.stop(&pipeline);
    assert_eq!(t.location, "http://feed.example/ep1.mp3");
    assert_eq!(t.state(), PlaybackState::Stopped);
}

#[test]
fn seek_bounds_are_enforced() {
    let pipeline = MockPipeline::default();
    let mut t = Track::local(Path::new("/music/song.mp3"));
    t.length = Length::Known(Duration::from_secs(180));
    t.play(&pipeline).unwrap();

    assert!(matches!(
        t.seek(&pipeline, -1),
        Err(PlayerError::OutOfRange(_))
    ));
    assert!(matches!(
        t.seek(&pipeline, 181),
        Err(PlayerError::OutOfRange(_))
    ));
    t.seek(&pipeline, 90).unwrap();
    assert!(pipeline.calls().contains(&Call::Seek(Duration::from_secs(90))));
}

#[test]
fn stream_duration_is_always_unknown() {
    let mut t = Track::stream("http://radio.example/live");
    // Even if something upstream smuggles a length in, it stays unknown.
    t.length = Length::Known(Duration::from_secs(42));
    assert_eq!(t.duration(), Length::Unknown);
}

#[test]
fn engine_tags_merge_with_stream_rules() {
    let mut t = Track::stream("http://radio.example/live");
    t.apply_engine_tags(&[
        ("title".into(), "Now Playing".into()),
        ("comment".into(), "The Hosts".into()),
        ("album".into(), "Should Not Stick".into()),
        ("bitrate".into(), "128000".into()),
        ("unknown-field".into(), "ignored".into()),
    ]);
    assert_eq!(t.title.as_deref(), Some("Now Playing"));
    // Comment doubles as artist for streams.
    assert_eq!(t.artist.as_deref(), Some("The Hosts"));
    // Album is pinned to the stream URL.
    assert_eq!(t.album.as_deref(), Some("http://radio.example/live"));
    assert_eq!(t.bitrate, Some(128));
}

#[test]
fn engine_tags_merge_for_local_tracks() {
    let mut t = Track::local(Path::new("/music/song.ape"));
    t.apply_engine_tags(&[
        ("comment".into(), "not the artist".into()),
        ("artist".into(), "Real Artist".into()),
        ("track number".into(), "3/12".into()),
    ]);
    // Comment stays a comment outside of streams.
    assert_eq!(t.artist.as_deref(), Some("Real Artist"));
    assert_eq!(t.track_no, 3);
    assert_eq!(t.disc_id, 12);
}

#[test]
fn podcasts_ignore_engine_tags() {
    let mut t = Track::podcast("http://feed.example/ep1.mp3", "/cache/ep1.mp3");
    t.title = Some("Episode 1".into());
    t.apply_engine_tags(&[("title".into(), "Garbage".into())]);
    assert_eq!(t.title.as_deref(), Some("Episode 1"));
}

#[test]
fn display_title_falls_back_to_file_stem() {
    let t = Track::local(Path::new("/music/Night Drive.mp3"));
    assert_eq!(t.display_title(), "Night Drive");

    let mut titled = Track::local(Path::new("/music/other.mp3"));
    titled.title = Some("A Real Title".into());
    assert_eq!(titled.display_title(), "A Real Title");
}

#[test]
fn unsupported_operations_by_kind() {
    let pipeline = MockPipeline::default();

    let mut dev = Track::device("device:///player/song.mp3");
    assert!(matches!(
        dev.play(&pipeline),
        Err(PlayerError::UnsupportedOperation(_))
    ));

    let stream = Track::stream("http://radio.example/live");
    assert!(matches!(
        stream.write_tag(),
        Err(PlayerError::UnsupportedOperation(_))
    ));

    let cd = Track::cd(3, Duration::from_secs(200));
    cd.write_tag().unwrap();
    assert_eq!(cd.title.as_deref(), Some("Track 3"));
    assert_eq!(cd.duration(), Length::Known(Duration::from_secs(200)));
}

#[test]
fn unknown_format_fails_tag_io() {
    let mut t = Track::local(Path::new("/music/readme.txt"));
    assert!(matches!(
        t.read_tag(),
        Err(PlayerError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        t.write_tag(),
        Err(PlayerError::UnsupportedFormat(_))
    ));
}

#[test]
fn submission_flag_is_single_flight() {
    let t = Track::local(Path::new("/music/song.mp3"));
    assert!(t.begin_submission());
    assert!(!t.begin_submission());

    t.submission_flag().store(false, Ordering::SeqCst);
    assert!(t.begin_submission());
}

#[test]
fn replay_resets_submission_flag() {
    let pipeline = MockPipeline::default();
    let mut t = Track::local(Path::new("/music/song.mp3"));
    assert!(t.begin_submission());

    t.play(&pipeline).unwrap();
    // A fresh play means a fresh submission opportunity.
    assert!(t.begin_submission());
}

#[test]
fn local_file_tags_load_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazy.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..8000u32 {
        writer.write_sample(((i % 100) as i16) * 50).unwrap();
    }
    writer.finalize().unwrap();

    let mut t = Track::local(&path);
    assert_eq!(t.length, Length::Unknown);
    t.ensure_tags().unwrap();
    assert!(matches!(t.duration(), Length::Known(d) if d >= Duration::from_millis(900)));
    // Second call is a no-op.
    t.ensure_tags().unwrap();
}
