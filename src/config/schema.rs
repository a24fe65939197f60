use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/vivace/config.toml` or
/// `~/.config/vivace/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `VIVACE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player: PlayerSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub scrobbler: ScrobblerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Output volume on the engine scale `[0.0, 1.5]`; values above 1.0
    /// amplify. Out-of-range values are clamped when applied.
    pub volume: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether random track selection starts enabled.
    pub shuffle: bool,
    /// Whether the queue wraps around at the end.
    pub repeat: bool,
    /// Whether dynamic queue refilling starts enabled. Only takes effect
    /// once a similarity provider has been registered.
    pub dynamic: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions treated as audio during scans (lowercase, no dot).
    pub extensions: Vec<String>,
    /// Whether directory scans follow symlinks.
    pub follow_links: bool,
    /// Whether directory scans recurse into subdirectories.
    pub recursive: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "ogg".into(),
                "oga".into(),
                "opus".into(),
                "m4a".into(),
                "mp4".into(),
                "wav".into(),
                "aiff".into(),
            ],
            follow_links: true,
            recursive: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScrobblerSettings {
    /// Whether completed tracks are submitted at all.
    pub enabled: bool,
    /// Submission endpoint of the listening-history service.
    pub endpoint: String,
    pub username: String,
    pub password: String,
}
