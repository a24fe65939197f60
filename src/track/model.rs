use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::{Pipeline, PipelineState, SessionId};
use crate::error::{PlayerError, Result};
use crate::formats::{self, FileTags, HandlerKind};

use super::meta::{parse_bitrate_field, parse_track_pair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// A file on local storage.
    Local,
    /// A network radio stream (or a playlist file pointing at one).
    Stream,
    /// One track of an audio CD.
    Cd,
    /// A podcast episode with a downloaded local copy.
    Podcast,
    /// A file on a portable device managed by an external library.
    Device,
}

/// Track length. Streamed sources never report a length; `Unknown` keeps
/// that distinct from a zero-length file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Known(Duration),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// A playable item and its metadata.
///
/// Tag fields are all optional; `track_no` and `disc_id` use `-1` for
/// "unknown". At most one track is audible at a time because all tracks
/// share one engine; the playlist controller enforces stop-before-play.
#[derive(Debug, Clone)]
pub struct Track {
    /// Active source location: a path or URL. For podcasts this swaps to
    /// the downloaded copy while playing.
    pub location: String,
    pub kind: TrackKind,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track_no: i32,
    pub disc_id: i32,
    /// User rating, 0..=5.
    pub rating: u8,
    pub length: Length,
    /// Average bitrate in kbps.
    pub bitrate: Option<u32>,
    state: PlaybackState,
    session: Option<SessionId>,
    download_path: Option<String>,
    remote_url: Option<String>,
    // One submission in flight per track; clones share the flag.
    submitting: Arc<AtomicBool>,
    tags_loaded: bool,
}

impl Track {
    fn base(location: String, kind: TrackKind) -> Self {
        Self {
            location,
            kind,
            title: None,
            artist: None,
            album: None,
            genre: None,
            year: None,
            track_no: -1,
            disc_id: -1,
            rating: 0,
            length: Length::Unknown,
            bitrate: None,
            state: PlaybackState::Stopped,
            session: None,
            download_path: None,
            remote_url: None,
            submitting: Arc::new(AtomicBool::new(false)),
            tags_loaded: false,
        }
    }

    pub fn local(path: &Path) -> Self {
        Self::base(path.to_string_lossy().into_owned(), TrackKind::Local)
    }

    pub fn stream(url: &str) -> Self {
        let mut t = Self::base(url.to_string(), TrackKind::Stream);
        t.title = Some(format!("Stream: {url}"));
        t.album = Some(url.to_string());
        t
    }

    /// CD tracks carry a fixed title and length from the disc TOC.
    pub fn cd(number: u32, length: Duration) -> Self {
        let mut t = Self::base(format!("cdda://{number}"), TrackKind::Cd);
        t.title = Some(format!("Track {number}"));
        t.track_no = number as i32;
        t.length = Length::Known(length);
        t
    }

    pub fn podcast(remote_url: &str, download_path: &str) -> Self {
        let mut t = Self::base(remote_url.to_string(), TrackKind::Podcast);
        t.remote_url = Some(remote_url.to_string());
        t.download_path = Some(download_path.to_string());
        t
    }

    pub fn device(location: &str) -> Self {
        Self::base(location.to_string(), TrackKind::Device)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// Session token of the bind this track currently owns, if any.
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Start (or resume) playback on the shared engine.
    ///
    /// Playing an already-playing track is a no-op. Resuming a paused
    /// stream rebinds from the start; true pause/resume is only possible
    /// for seekable sources.
    pub fn play(&mut self, pipeline: &dyn Pipeline) -> Result<()> {
        if self.kind == TrackKind::Device {
            return Err(PlayerError::UnsupportedOperation(
                "playback of device tracks",
            ));
        }
        match self.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused => {
                pipeline.set_state(PipelineState::Playing);
                self.state = PlaybackState::Playing;
                Ok(())
            }
            PlaybackState::Stopped => {
                if self.kind == TrackKind::Podcast {
                    if let Some(path) = &self.download_path {
                        self.location = path.clone();
                    }
                }
                self.submitting.store(false, Ordering::SeqCst);
                self.session = Some(pipeline.bind(&self.location));
                self.state = PlaybackState::Playing;
                Ok(())
            }
        }
    }

    /// Toggle pause. Streamed sources cannot hold their position, so
    /// pausing them stops the pipeline; resuming restarts from zero.
    pub fn pause(&mut self, pipeline: &dyn Pipeline) {
        match self.kind {
            TrackKind::Stream | TrackKind::Podcast => {
                if self.state == PlaybackState::Playing {
                    self.stop(pipeline);
                }
            }
            _ => match self.state {
                PlaybackState::Playing => {
                    pipeline.set_state(PipelineState::Paused);
                    self.state = PlaybackState::Paused;
                }
                PlaybackState::Paused => {
                    pipeline.set_state(PipelineState::Playing);
                    self.state = PlaybackState::Playing;
                }
                PlaybackState::Stopped => {}
            },
        }
    }

    pub fn stop(&mut self, pipeline: &dyn Pipeline) {
        if self.state != PlaybackState::Stopped {
            pipeline.set_state(PipelineState::Stopped);
        }
        self.finished();
    }

    /// Bookkeeping-only stop, used when the engine reports end of stream
    /// (the pipeline has already torn the sink down).
    pub fn finished(&mut self) {
        self.state = PlaybackState::Stopped;
        self.session = None;
        if self.kind == TrackKind::Podcast {
            if let Some(url) = &self.remote_url {
                self.location = url.clone();
            }
        }
    }

    /// Seek to an absolute position in seconds.
    pub fn seek(&mut self, pipeline: &dyn Pipeline, secs: i64) -> Result<()> {
        if secs < 0 {
            return Err(PlayerError::OutOfRange(format!("seek to {secs}s")));
        }
        if let Length::Known(d) = self.duration() {
            if secs as u64 > d.as_secs() {
                return Err(PlayerError::OutOfRange(format!(
                    "seek to {secs}s in a {}s track",
                    d.as_secs()
                )));
            }
        }
        pipeline.seek(Duration::from_secs(secs as u64));
        Ok(())
    }

    pub fn position(&self, pipeline: &dyn Pipeline) -> Option<Duration> {
        if self.state == PlaybackState::Stopped {
            return None;
        }
        pipeline.position()
    }

    /// Length of the track. Streamed sources are always `Unknown`, even if
    /// something upstream claims otherwise.
    pub fn duration(&self) -> Length {
        match self.kind {
            TrackKind::Stream | TrackKind::Podcast => Length::Unknown,
            _ => self.length,
        }
    }

    /// Read tags from the source if the format supports it.
    pub fn read_tag(&mut self) -> Result<()> {
        match self.kind {
            // Disc and streamed metadata arrives through the engine.
            TrackKind::Cd | TrackKind::Stream | TrackKind::Podcast => {
                self.tags_loaded = true;
                Ok(())
            }
            TrackKind::Device => Err(PlayerError::UnsupportedOperation(
                "tag reads on device tracks",
            )),
            TrackKind::Local => {
                match self.handler()? {
                    HandlerKind::Pipeline => {
                        // Playable, but no tag reader for this family.
                    }
                    HandlerKind::Tagged => {
                        let tags = formats::read_file_tags(Path::new(&self.location))?;
                        self.apply_file_tags(tags);
                    }
                }
                self.tags_loaded = true;
                Ok(())
            }
        }
    }

    /// Persist tags back to the source.
    pub fn write_tag(&self) -> Result<()> {
        match self.kind {
            // CD tags live in the user's disc database, nothing to write.
            TrackKind::Cd => Ok(()),
            TrackKind::Stream | TrackKind::Podcast => Err(PlayerError::UnsupportedOperation(
                "tag writes to streamed sources",
            )),
            TrackKind::Device => Err(PlayerError::UnsupportedOperation(
                "tag writes on device tracks",
            )),
            TrackKind::Local => match self.handler()? {
                HandlerKind::Pipeline => {
                    Err(PlayerError::UnsupportedFormat(self.extension().to_string()))
                }
                HandlerKind::Tagged => {
                    formats::write_file_tags(Path::new(&self.location), &self.file_tags())
                }
            },
        }
    }

    /// Read tags once, lazily.
    pub fn ensure_tags(&mut self) -> Result<()> {
        if self.tags_loaded {
            return Ok(());
        }
        self.read_tag()
    }

    /// Merge tags reported by the engine during playback.
    ///
    /// Field names use the engine vocabulary; unrecognized names are
    /// dropped. Podcast metadata comes from the feed, so engine tags are
    /// ignored there. For streams the comment field doubles as the artist
    /// and the album is pinned to the stream URL.
    pub fn apply_engine_tags(&mut self, found: &[(String, String)]) {
        if self.kind == TrackKind::Podcast {
            return;
        }
        for (name, value) in found {
            if value.is_empty() {
                continue;
            }
            match name.as_str() {
                "title" => self.title = Some(value.clone()),
                "artist" => self.artist = Some(value.clone()),
                "album" => self.album = Some(value.clone()),
                "genre" => self.genre = Some(value.clone()),
                "comment" => {
                    if self.kind == TrackKind::Stream {
                        self.artist = Some(value.clone());
                    }
                }
                "bitrate" => {
                    if let Some(kbps) = parse_bitrate_field(value) {
                        self.bitrate = Some(kbps);
                    }
                }
                "track number" => {
                    let (n, m) = parse_track_pair(value);
                    if n > -1 {
                        self.track_no = n;
                    }
                    if m > -1 {
                        self.disc_id = m;
                    }
                }
                _ => {}
            }
        }
        if self.kind == TrackKind::Stream {
            self.album = Some(self.location.clone());
        }
    }

    /// Title for display. Falls back to the file stem when the track has
    /// no title, artist, or album at all.
    pub fn display_title(&self) -> String {
        if let Some(t) = &self.title {
            if !t.is_empty() {
                return t.clone();
            }
        }
        if self.artist.is_none() && self.album.is_none() {
            if let Some(stem) = Path::new(&self.location).file_stem() {
                return stem.to_string_lossy().into_owned();
            }
        }
        self.location.clone()
    }

    /// Flip the in-flight submission flag; `false` means a submission for
    /// this play is already running.
    pub fn begin_submission(&self) -> bool {
        self.submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn submission_flag(&self) -> Arc<AtomicBool> {
        self.submitting.clone()
    }

    fn extension(&self) -> &str {
        Path::new(&self.location)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }

    fn handler(&self) -> Result<HandlerKind> {
        let ext = self.extension();
        formats::resolve(ext).ok_or_else(|| PlayerError::UnsupportedFormat(ext.to_string()))
    }

    fn apply_file_tags(&mut self, tags: FileTags) {
        if tags.title.is_some() {
            self.title = tags.title;
        }
        if tags.artist.is_some() {
            self.artist = tags.artist;
        }
        if tags.album.is_some() {
            self.album = tags.album;
        }
        if tags.genre.is_some() {
            self.genre = tags.genre;
        }
        if tags.year.is_some() {
            self.year = tags.year;
        }
        if tags.track_no > -1 {
            self.track_no = tags.track_no;
        }
        if tags.disc_id > -1 {
            self.disc_id = tags.disc_id;
        }
        if !tags.duration.is_zero() {
            self.length = Length::Known(tags.duration);
        }
        if tags.bitrate.is_some() {
            self.bitrate = tags.bitrate;
        }
    }

    fn file_tags(&self) -> FileTags {
        FileTags {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            genre: self.genre.clone(),
            year: self.year.clone(),
            track_no: self.track_no,
            disc_id: self.disc_id,
            duration: match self.length {
                Length::Known(d) => d,
                Length::Unknown => Duration::ZERO,
            },
            bitrate: self.bitrate,
        }
    }
}
