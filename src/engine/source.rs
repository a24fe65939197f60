//! Resolving a URI into something rodio can decode.
//!
//! Local files decode straight from disk. Remote sources are fetched into
//! memory first (with `Buffering` progress events) because the decoder
//! needs a seekable reader. Playlist files (`.pls`/`.m3u`) are expanded to
//! their first entry here, on the engine thread, so the control thread
//! never blocks on network I/O.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use tracing::debug;

use crate::error::{PlayerError, Result};

use super::types::{EngineEvent, SessionId};

/// Cheaply cloneable byte buffer; `Cursor<SharedBytes>` is `Read + Seek`.
#[derive(Debug, Clone)]
pub(super) struct SharedBytes(pub Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub(super) enum LoadedSource {
    File(PathBuf),
    Memory { name: String, bytes: SharedBytes },
}

/// Resolve `uri` to a decodable source, expanding playlist files once.
pub(super) fn load(
    uri: &str,
    session: SessionId,
    events: &Sender<(SessionId, EngineEvent)>,
) -> Result<LoadedSource> {
    load_inner(uri, session, events, true)
}

fn load_inner(
    uri: &str,
    session: SessionId,
    events: &Sender<(SessionId, EngineEvent)>,
    allow_playlist: bool,
) -> Result<LoadedSource> {
    if let Some(path) = uri.strip_prefix("file://") {
        if allow_playlist && is_playlist_path(path) {
            let body = std::fs::read_to_string(path)?;
            return expand_playlist(&body, session, events);
        }
        return Ok(LoadedSource::File(PathBuf::from(path)));
    }

    if uri.starts_with("http://") || uri.starts_with("https://") {
        if allow_playlist && is_playlist_path(uri) {
            let body = reqwest::blocking::get(uri)?.text()?;
            return expand_playlist(&body, session, events);
        }
        let bytes = fetch(uri, session, events)?;
        return Ok(LoadedSource::Memory {
            name: uri.to_string(),
            bytes: SharedBytes(Arc::new(bytes)),
        });
    }

    if uri.starts_with("cdda://") {
        return Err(PlayerError::Pipeline(format!(
            "no disc reader available for {uri}"
        )));
    }

    if let Some((scheme, _)) = uri.split_once("://") {
        return Err(PlayerError::Pipeline(format!(
            "unsupported scheme: {scheme}"
        )));
    }

    // Bare paths are treated as local files.
    if allow_playlist && is_playlist_path(uri) {
        let body = std::fs::read_to_string(uri)?;
        return expand_playlist(&body, session, events);
    }
    Ok(LoadedSource::File(PathBuf::from(uri)))
}

fn expand_playlist(
    body: &str,
    session: SessionId,
    events: &Sender<(SessionId, EngineEvent)>,
) -> Result<LoadedSource> {
    let entry = first_playlist_entry(body)
        .ok_or_else(|| PlayerError::Pipeline("playlist file has no entries".to_string()))?;
    debug!(entry, "expanded playlist file");
    load_inner(&entry, session, events, false)
}

/// First playable entry of a `.pls` or `.m3u` body.
///
/// `.pls` entries look like `File1=...`; other `key=value` lines and the
/// `[playlist]` header are skipped. `.m3u` entries are plain lines with
/// `#`-comments.
pub(super) fn first_playlist_entry(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("[playlist]") {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim().to_ascii_lowercase().starts_with("file") && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
            continue;
        }
        return Some(line.to_string());
    }
    None
}

pub(super) fn is_playlist_path(uri: &str) -> bool {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".pls") || lower.ends_with(".m3u")
}

/// Download a remote source into memory, reporting progress.
fn fetch(
    uri: &str,
    session: SessionId,
    events: &Sender<(SessionId, EngineEvent)>,
) -> Result<Vec<u8>> {
    let mut resp = reqwest::blocking::get(uri)?;
    let total = resp.content_length();

    let _ = events.send((session, EngineEvent::Buffering(0)));

    let mut out = Vec::new();
    let mut chunk = [0u8; 64 * 1024];
    let mut last_pct = 0u8;
    loop {
        let n = resp.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
        if let Some(total) = total {
            if total > 0 {
                let pct = ((out.len() as u64).min(total) * 100 / total) as u8;
                if pct > last_pct {
                    last_pct = pct;
                    let _ = events.send((session, EngineEvent::Buffering(pct)));
                }
            }
        }
    }
    if last_pct < 100 {
        let _ = events.send((session, EngineEvent::Buffering(100)));
    }
    Ok(out)
}

/// Best-effort tag probe of a loaded source, in the engine vocabulary.
/// Probe failures yield an empty list rather than an error.
pub(super) fn probe_tags(source: &LoadedSource) -> Vec<(String, String)> {
    let tagged = match source {
        LoadedSource::File(path) => match lofty::read_from_path(path) {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        },
        LoadedSource::Memory { bytes, .. } => {
            let cursor = std::io::Cursor::new(bytes.clone());
            let probe = match Probe::new(cursor).guess_file_type() {
                Ok(p) => p,
                Err(_) => return Vec::new(),
            };
            match probe.read() {
                Ok(t) => t,
                Err(_) => return Vec::new(),
            }
        }
    };

    let mut found = Vec::new();
    if let Some(kbps) = tagged.properties().audio_bitrate() {
        // Engine vocabulary carries bitrate in bits per second.
        found.push(("bitrate".to_string(), (kbps * 1000).to_string()));
    }
    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        let mut push = |name: &str, value: Option<String>| {
            if let Some(v) = value {
                if !v.is_empty() {
                    found.push((name.to_string(), v));
                }
            }
        };
        push("title", tag.title().map(|s| s.to_string()));
        push("artist", tag.artist().map(|s| s.to_string()));
        push("album", tag.album().map(|s| s.to_string()));
        push("genre", tag.genre().map(|s| s.to_string()));
        push("comment", tag.comment().map(|s| s.to_string()));
        push(
            "track number",
            tag.get_string(&ItemKey::TrackNumber).map(|s| s.to_string()),
        );
    }
    found
}
