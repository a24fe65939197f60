//! Queue/playlist control.
//!
//! Owns the ordered track list, the advance rules (sequential, random,
//! repeat, stop-after) and dynamic refilling through a pluggable
//! suggestion provider.

mod controller;

pub use controller::{FILL_LOW_WATER, Playlist, QueueState, SuggestionProvider};

#[cfg(test)]
mod tests;
