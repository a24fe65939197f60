//! Directory scanning.
//!
//! Walks a directory for supported audio files and builds local tracks.
//! Tags are not read here; tracks load them lazily when first needed.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::track::Track;

/// Scan `root` for audio files matching the configured extensions, sorted
/// by display title (case-insensitive).
pub fn scan(root: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut walker = WalkDir::new(root).follow_links(settings.follow_links);
    if !settings.recursive {
        walker = walker.max_depth(1);
    }

    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| {
                    let e = e.to_ascii_lowercase();
                    settings.extensions.iter().any(|x| x.as_str() == e)
                })
                .unwrap_or(false)
        })
        .map(|entry| Track::local(entry.path()))
        .collect();

    tracks.sort_by_key(|t| t.display_title().to_lowercase());
    debug!(count = tracks.len(), root = %root.display(), "scanned library");
    tracks
}
