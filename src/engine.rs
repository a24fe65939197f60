//! Playback engine adapter.
//!
//! One process-wide rodio output stream lives on a dedicated engine thread.
//! Callers interact through [`PlaybackEngine`]: commands go in over an mpsc
//! channel, confirmation comes back asynchronously as `(SessionId,
//! EngineEvent)` pairs. Every event carries the session token of the bind
//! that produced it, so consumers can drop events from a source they have
//! already abandoned.

mod handle;
mod source;
mod thread;
mod types;

pub use handle::PlaybackEngine;
pub use types::{
    EngineEvent, Pipeline, PipelineHandle, PipelineInfo, PipelineState, SessionId, clamp_volume,
};
