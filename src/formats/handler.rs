use std::path::Path;
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::file::FileType;
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag, TagType};
use tempfile::NamedTempFile;

use crate::error::{PlayerError, Result};
use crate::track::parse_track_pair;

/// Canonical field set carried between files and tracks.
///
/// Track number and disc id use `-1` for "unknown"; everything else is
/// simply absent when unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track_no: i32,
    pub disc_id: i32,
    pub duration: Duration,
    /// Average bitrate in kbps.
    pub bitrate: Option<u32>,
}

impl FileTags {
    pub fn unknown() -> Self {
        Self {
            track_no: -1,
            disc_id: -1,
            ..Self::default()
        }
    }
}

/// Read tags and audio properties from a local file.
pub fn read_file_tags(path: &Path) -> Result<FileTags> {
    let tagged = lofty::read_from_path(path)?;

    let mut out = FileTags::unknown();
    let props = tagged.properties();
    out.duration = props.duration();
    out.bitrate = props.audio_bitrate();

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        out.title = tag.title().map(|s| s.to_string()).filter(|s| !s.is_empty());
        out.artist = tag.artist().map(|s| s.to_string()).filter(|s| !s.is_empty());
        out.album = tag.album().map(|s| s.to_string()).filter(|s| !s.is_empty());
        out.genre = tag.genre().map(|s| s.to_string()).filter(|s| !s.is_empty());
        out.year = tag.year().map(|y| y.to_string());

        // Prefer the raw string so "3/12" style values survive parsing.
        if let Some(raw) = tag.get_string(&ItemKey::TrackNumber) {
            let (n, m) = parse_track_pair(raw);
            out.track_no = n;
            out.disc_id = m;
        } else if let Some(n) = tag.track() {
            out.track_no = n as i32;
        }
        if out.disc_id < 0 {
            if let Some(total) = tag.track_total() {
                out.disc_id = total as i32;
            }
        }
    }

    Ok(out)
}

/// Write tags to a local file atomically.
///
/// The original is copied to a temp file in the same directory, tags are
/// written there, and the temp file is renamed over the original. A failure
/// at any step leaves the original file untouched.
pub fn write_file_tags(path: &Path, tags: &FileTags) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| PlayerError::IoFailure(format!("no parent directory: {}", path.display())))?;

    let tmp = NamedTempFile::new_in(parent)?;
    std::fs::copy(path, tmp.path())?;

    let tagged = lofty::read_from_path(tmp.path())?;
    let mut tag = Tag::new(write_tag_type(tagged.file_type()));

    if let Some(v) = &tags.title {
        tag.set_title(v.clone());
    }
    if let Some(v) = &tags.artist {
        tag.set_artist(v.clone());
    }
    if let Some(v) = &tags.album {
        tag.set_album(v.clone());
    }
    if let Some(v) = &tags.genre {
        tag.set_genre(v.clone());
    }
    if let Some(v) = &tags.year {
        if let Ok(y) = v.parse::<u32>() {
            tag.set_year(y);
        }
    }
    if tags.track_no > -1 {
        tag.insert_text(ItemKey::TrackNumber, tags.track_no.to_string());
    }
    if tags.disc_id > -1 {
        tag.insert_text(ItemKey::TrackTotal, tags.disc_id.to_string());
    }

    tag.save_to_path(tmp.path(), WriteOptions::default())?;

    tmp.persist(path)
        .map_err(|e| PlayerError::from(e.error))?;
    Ok(())
}

// Families that commonly carry a non-primary tag still get a sensible
// container (ID3v2 on WAV/AIFF rather than RIFF INFO).
fn write_tag_type(file_type: FileType) -> TagType {
    match file_type {
        FileType::Mpeg | FileType::Wav | FileType::Aiff => TagType::Id3v2,
        FileType::Flac | FileType::Vorbis | FileType::Opus | FileType::Speex => {
            TagType::VorbisComments
        }
        FileType::Mp4 => TagType::Mp4Ilst,
        other => other.primary_tag_type(),
    }
}
