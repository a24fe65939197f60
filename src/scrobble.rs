//! Listening-history submission.
//!
//! Completed tracks are posted to a configured endpoint on a detached
//! thread. Submission is best-effort: failures are logged and surfaced as
//! a transient notice, never retried, never fatal.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ScrobblerSettings;
use crate::track::{Length, Track, TrackKind};

/// Transient status text for the user, drained by the runtime loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice(pub String);

pub struct Scrobbler {
    enabled: bool,
    endpoint: String,
    username: String,
    password: String,
    notices: Sender<Notice>,
}

impl Scrobbler {
    pub fn new(settings: &ScrobblerSettings, notices: Sender<Notice>) -> Self {
        Self {
            enabled: settings.enabled,
            endpoint: settings.endpoint.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            notices,
        }
    }

    /// Submit a finished track. At most one submission per track instance
    /// is in flight; the guard flag is cleared whatever the outcome.
    pub fn submit(&self, track: &Track) {
        if !self.enabled || !should_submit(track) {
            return;
        }
        if !track.begin_submission() {
            debug!("submission already in flight for this track");
            return;
        }

        let endpoint = self.endpoint.clone();
        let username = self.username.clone();
        let password = self.password.clone();
        let notices = self.notices.clone();
        let flag = track.submission_flag();

        let artist = track.artist.clone().unwrap_or_default();
        let title = track.title.clone().unwrap_or_default();
        let album = track.album.clone().unwrap_or_default();
        let length_secs = match track.duration() {
            Length::Known(d) => d.as_secs(),
            Length::Unknown => 0,
        };
        let date_played = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        thread::spawn(move || {
            let result = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .and_then(|client| {
                    client
                        .post(&endpoint)
                        .form(&[
                            ("u", username.as_str()),
                            ("p", password.as_str()),
                            ("artist", artist.as_str()),
                            ("title", title.as_str()),
                            ("album", album.as_str()),
                            ("length", &length_secs.to_string()),
                            ("date_played", date_played.as_str()),
                        ])
                        .send()
                })
                .and_then(|resp| resp.error_for_status());

            match result {
                Ok(_) => {
                    info!(title, artist, "track submitted");
                    let _ = notices.send(Notice(format!("Submitted: {artist} - {title}")));
                }
                Err(e) => {
                    warn!("scrobble submission failed: {e}");
                    let _ = notices.send(Notice(format!("Submission failed: {e}")));
                }
            }
            flag.store(false, std::sync::atomic::Ordering::SeqCst);
        });
    }
}

/// Streams and tracks without identifying metadata are never submitted.
fn should_submit(track: &Track) -> bool {
    if track.kind == TrackKind::Stream {
        return false;
    }
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    has(&track.title) && has(&track.artist)
}
