use std::{env, path::PathBuf};

use super::schema::Settings;

impl Settings {
    /// Load settings from the config file (if any) with environment
    /// overrides. Missing file is not an error; defaults apply.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("VIVACE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Basic sanity checks on loaded values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.5).contains(&self.player.volume) {
            return Err("player.volume must be within 0.0..=1.5".to_string());
        }
        if self.scrobbler.enabled && self.scrobbler.endpoint.is_empty() {
            return Err("scrobbler.endpoint must be set when scrobbler.enabled".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `VIVACE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("VIVACE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/vivace/config.toml`, falling back to
/// `~/.config/vivace/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("vivace").join("config.toml"))
}
