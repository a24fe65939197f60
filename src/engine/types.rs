//! Engine-facing small types and handles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Token identifying one bind of one source. Events are tagged with the
/// session that produced them; a stale token means the event refers to a
/// source that has since been unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug)]
pub(super) enum EngineCmd {
    /// Tear down the current sink and start decoding `uri`.
    Bind { session: SessionId, uri: String },
    SetState(PipelineState),
    /// Absolute seek within the bound source.
    Seek(Duration),
    SetVolume(f32),
    /// Shut the engine thread down.
    Quit,
}

/// Asynchronous notifications from the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Tags discovered while binding, in the engine's own vocabulary
    /// (`title`, `artist`, `album`, `genre`, `comment`, `bitrate`,
    /// `track number`).
    TagsFound(Vec<(String, String)>),
    /// The bound source played to completion.
    EndOfStream,
    /// Remote fetch progress, 0..=100.
    Buffering(u8),
    /// The backend failed; the source is no longer bound.
    Error(String),
}

/// Runtime playback information shared with the control thread.
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    /// Elapsed time in the bound source, `None` when nothing is bound.
    pub elapsed: Option<Duration>,
    pub playing: bool,
    pub volume: f32,
}

impl Default for PipelineInfo {
    fn default() -> Self {
        Self {
            elapsed: None,
            playing: false,
            volume: 1.0,
        }
    }
}

pub type PipelineHandle = Arc<Mutex<PipelineInfo>>;

/// Clamp a volume value to the engine scale. Non-finite input mutes.
pub fn clamp_volume(v: f32) -> f32 {
    if !v.is_finite() {
        return 0.0;
    }
    v.clamp(0.0, 1.5)
}

/// The surface tracks drive playback through. The production impl is
/// [`super::PlaybackEngine`]; tests substitute a recording double.
pub trait Pipeline {
    fn bind(&self, uri: &str) -> SessionId;
    fn set_state(&self, state: PipelineState);
    fn seek(&self, pos: Duration);
    /// Fail-soft: `None` when nothing is bound or the position is unknown.
    fn position(&self) -> Option<Duration>;
}
