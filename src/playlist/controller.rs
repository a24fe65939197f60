use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use rand::RngExt;
use tracing::debug;

use crate::error::{PlayerError, Result};
use crate::track::Track;

/// Queue length below which a dynamic fill request fires.
pub const FILL_LOW_WATER: usize = 5;

/// Source of similar tracks for dynamic playlists.
///
/// `suggest` may block (it usually talks to a recommendation backend), so
/// it is always called on a detached thread.
pub trait SuggestionProvider: Send + Sync {
    fn suggest(&self, seed: &Track, count: usize) -> Vec<Track>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No tracks loaded.
    NoPlaylist,
    Stopped,
    Playing,
}

/// The playback queue and its advance rules.
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
    playing: bool,
    random: bool,
    repeat: bool,
    dynamic: bool,
    /// Index after which playback stops, cleared once it fires.
    stop_after: Option<usize>,
    provider: Option<Arc<dyn SuggestionProvider>>,
    fill_tx: Sender<Vec<Track>>,
    fill_rx: Receiver<Vec<Track>>,
    fill_pending: bool,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        let (fill_tx, fill_rx) = channel();
        Self {
            tracks,
            current: None,
            playing: false,
            random: false,
            repeat: false,
            dynamic: false,
            stop_after: None,
            provider: None,
            fill_tx,
            fill_rx,
            fill_pending: false,
        }
    }

    pub fn state(&self) -> QueueState {
        if self.tracks.is_empty() {
            QueueState::NoPlaylist
        } else if self.playing {
            QueueState::Playing
        } else {
            QueueState::Stopped
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn current_mut(&mut self) -> Option<&mut Track> {
        match self.current {
            Some(i) => self.tracks.get_mut(i),
            None => None,
        }
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn append(&mut self, tracks: Vec<Track>) {
        self.tracks.extend(tracks);
    }

    /// Make `index` current without touching playback state. Returns the
    /// selected track.
    pub fn select(&mut self, index: usize) -> Option<&mut Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current = Some(index);
        self.tracks.get_mut(index)
    }

    pub fn mark_playing(&mut self) {
        self.playing = true;
        self.maybe_request_fill();
    }

    pub fn mark_stopped(&mut self) {
        self.playing = false;
    }

    pub fn random(&self) -> bool {
        self.random
    }

    pub fn set_random(&mut self, on: bool) {
        self.random = on;
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, on: bool) {
        self.repeat = on;
    }

    pub fn set_provider(&mut self, provider: Arc<dyn SuggestionProvider>) {
        self.provider = Some(provider);
    }

    /// Enable or disable dynamic refilling. Enabling requires a registered
    /// provider; the combination "dynamic but nobody to ask" is rejected
    /// rather than left latent.
    pub fn set_dynamic(&mut self, on: bool) -> Result<()> {
        if on && self.provider.is_none() {
            return Err(PlayerError::UnsupportedOperation(
                "dynamic playlists without a suggestion provider",
            ));
        }
        self.dynamic = on;
        Ok(())
    }

    pub fn set_stop_after(&mut self, index: Option<usize>) {
        self.stop_after = index;
    }

    /// Advance to the track that should play next, if any.
    ///
    /// Reaching the end without `repeat` transitions to Stopped; it never
    /// silently wraps. A stop-after marker on the finishing track stops
    /// playback and clears itself.
    pub fn next(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            self.playing = false;
            return None;
        }

        if self.current.is_some() && self.stop_after == self.current {
            self.stop_after = None;
            self.playing = false;
            return None;
        }

        let picked = if self.random {
            Some(self.random_pick())
        } else {
            match self.current {
                Some(cur) if cur + 1 < self.tracks.len() => Some(cur + 1),
                Some(_) if self.repeat => Some(0),
                Some(_) => None,
                None => Some(0),
            }
        };

        match picked {
            Some(i) => {
                self.current = Some(i);
                self.playing = true;
                self.maybe_request_fill();
                Some(i)
            }
            None => {
                self.playing = false;
                None
            }
        }
    }

    /// Step back to the previous track, wrapping only with `repeat`.
    pub fn prev(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            self.playing = false;
            return None;
        }

        let picked = if self.random {
            Some(self.random_pick())
        } else {
            match self.current {
                Some(cur) if cur > 0 => Some(cur - 1),
                Some(_) if self.repeat => Some(self.tracks.len() - 1),
                Some(_) => None,
                None => Some(0),
            }
        };

        match picked {
            Some(i) => {
                self.current = Some(i);
                self.playing = true;
                self.maybe_request_fill();
                Some(i)
            }
            None => None,
        }
    }

    /// Uniform pick excluding the current index when there is a choice.
    fn random_pick(&self) -> usize {
        let len = self.tracks.len();
        let mut rng = rand::rng();
        match self.current {
            Some(cur) if len > 1 => {
                let mut i = rng.random_range(0..len - 1);
                if i >= cur {
                    i += 1;
                }
                i
            }
            _ => rng.random_range(0..len),
        }
    }

    fn maybe_request_fill(&mut self) {
        if !self.dynamic || self.fill_pending || !self.playing {
            return;
        }
        if self.tracks.len() >= FILL_LOW_WATER {
            return;
        }
        let Some(provider) = self.provider.clone() else {
            return;
        };
        let Some(seed) = self.current().cloned() else {
            return;
        };
        let tx = self.fill_tx.clone();
        self.fill_pending = true;
        debug!(len = self.tracks.len(), "requesting dynamic fill");
        thread::spawn(move || {
            let more = provider.suggest(&seed, FILL_LOW_WATER);
            let _ = tx.send(more);
        });
    }

    /// Drain any completed fill requests into the queue. Returns how many
    /// tracks arrived.
    pub fn poll_fill(&mut self) -> usize {
        let mut added = 0;
        while let Ok(batch) = self.fill_rx.try_recv() {
            self.fill_pending = false;
            added += batch.len();
            self.tracks.extend(batch);
        }
        added
    }
}
