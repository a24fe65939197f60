/// How a file format is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Full tag support: metadata can be read and written.
    Tagged,
    /// Decodable by the playback backend, but tags cannot be written.
    Pipeline,
}

/// Look up the handler for a file extension.
///
/// Matching is case-insensitive and tolerates a leading dot. `None` means
/// the format is not supported at all. Tag families disabled at compile
/// time degrade to [`HandlerKind::Pipeline`].
pub fn resolve(extension: &str) -> Option<HandlerKind> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => Some(tagged_if(cfg!(feature = "tag-mp3"))),
        "ogg" | "oga" | "flac" | "opus" | "spx" => Some(tagged_if(cfg!(feature = "tag-vorbis"))),
        "m4a" | "m4b" | "mp4" => Some(tagged_if(cfg!(feature = "tag-mp4"))),
        "wav" | "aiff" | "aif" => Some(tagged_if(cfg!(feature = "tag-riff"))),
        // Playable but no tag writer wired up.
        "aac" | "mpc" | "wv" | "ape" | "wma" => Some(HandlerKind::Pipeline),
        _ => None,
    }
}

fn tagged_if(enabled: bool) -> HandlerKind {
    if enabled {
        HandlerKind::Tagged
    } else {
        HandlerKind::Pipeline
    }
}
