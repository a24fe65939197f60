use tracing::warn;

use crate::config::Settings;

pub fn load_settings() -> Settings {
    match Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                warn!("invalid config, using defaults: {msg}");
                Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent startup.
            warn!("failed to load config, using defaults: {e}");
            Settings::default()
        }
    }
}
