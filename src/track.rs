//! The track abstraction.
//!
//! One closed sum of source kinds (local file, network stream, CD audio,
//! podcast episode, portable device) behind a single playback and tag
//! interface. Per-kind behavior lives in match arms on [`TrackKind`], not
//! in separate types.

mod meta;
mod model;

pub use meta::{format_bitrate, parse_bitrate_field, parse_track_pair, rating_stars};
pub use model::{Length, PlaybackState, Track, TrackKind};

#[cfg(test)]
mod tests;
