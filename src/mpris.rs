//! Remote control over DBus, using the legacy `org.freedesktop.MediaPlayer`
//! interface (`/` root object and `/Player`).
//!
//! The service runs on its own thread. Method calls are translated into
//! [`ControlCmd`] values for the runtime loop; state flows the other way
//! through a shared snapshot plus a signal-request channel.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use async_io::{Timer, block_on};
use tracing::warn;
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{OwnedValue, Value};

use crate::track::PlaybackState;

const BUS_NAME: &str = "org.mpris.vivace";
const PLAYER_PATH: &str = "/Player";

const CAN_GO_NEXT: i32 = 1 << 0;
const CAN_GO_PREV: i32 = 1 << 1;
const CAN_PAUSE: i32 = 1 << 2;
const CAN_PLAY: i32 = 1 << 3;
const CAN_SEEK: i32 = 1 << 4;
const CAN_PROVIDE_METADATA: i32 = 1 << 5;
const CAN_HAS_TRACKLIST: i32 = 1 << 6;

/// Fixed capability set. Single-track repeat is the one thing missing.
pub const PLAYER_CAPS: i32 = CAN_GO_NEXT
    | CAN_GO_PREV
    | CAN_PAUSE
    | CAN_PLAY
    | CAN_SEEK
    | CAN_PROVIDE_METADATA
    | CAN_HAS_TRACKLIST;

/// Commands a remote caller can issue.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    /// Volume as a percentage, 0..=100.
    SetVolume(i32),
    /// Absolute position in milliseconds.
    SetPosition(i64),
    Quit,
}

/// Metadata snapshot of the current track, as exposed over the bus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMeta {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub location: String,
    pub length_secs: Option<u64>,
    pub bitrate_kbps: Option<u32>,
    pub track_no: i32,
    /// 0..=5 stars; 0 means unrated.
    pub rating: u8,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: Option<PlaybackState>,
    random: bool,
    repeat: bool,
    volume_pct: i32,
    position_ms: i64,
    length_ms: Option<i64>,
    meta: Option<TrackMeta>,
}

/// Signals the runtime asks the service thread to emit.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SignalRequest {
    TrackChange,
    StatusChange,
    CapsChange,
}

/// The `GetStatus` tuple: playback (0 playing, 1 paused, 2 stopped),
/// random flag, single-track repeat (always 0 here), playlist repeat flag.
fn status_tuple(
    playback: Option<PlaybackState>,
    random: bool,
    repeat: bool,
) -> (i32, i32, i32, i32) {
    let playing = match playback {
        Some(PlaybackState::Playing) => 0,
        Some(PlaybackState::Paused) => 1,
        _ => 2,
    };
    (
        playing,
        if random { 1 } else { 0 },
        0,
        if repeat { 1 } else { 0 },
    )
}

fn ov(value: Value<'_>) -> OwnedValue {
    OwnedValue::try_from(value).unwrap_or_else(|_| OwnedValue::from(0i32))
}

/// Build the `a{sv}` metadata map for a track snapshot.
fn metadata_map(meta: &TrackMeta) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    for (key, value) in [
        ("title", &meta.title),
        ("artist", &meta.artist),
        ("album", &meta.album),
        ("genre", &meta.genre),
    ] {
        if let Some(v) = value {
            map.insert(key.to_string(), ov(Value::from(v.clone())));
        }
    }

    map.insert(
        "location".to_string(),
        ov(Value::from(meta.location.clone())),
    );
    if let Some(secs) = meta.length_secs {
        map.insert("time".to_string(), ov(Value::from(secs as i32)));
    }
    if let Some(kbps) = meta.bitrate_kbps {
        map.insert("audio-bitrate".to_string(), ov(Value::from(kbps as i32)));
    }
    if meta.track_no > -1 {
        map.insert("tracknumber".to_string(), ov(Value::from(meta.track_no)));
    }
    if meta.rating > 0 {
        map.insert("rating".to_string(), ov(Value::from(meta.rating as i32)));
    }
    map
}

fn volume_in_range(pct: i32) -> bool {
    (0..=100).contains(&pct)
}

/// Position requests outside `[0, length]` are ignored, matching the wire
/// contract. Unknown length (streams) accepts any non-negative position.
fn position_acceptable(ms: i64, length_ms: Option<i64>) -> bool {
    ms >= 0 && length_ms.is_none_or(|l| ms <= l)
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.freedesktop.MediaPlayer")]
impl RootIface {
    fn identity(&self) -> String {
        format!("vivace {}", env!("CARGO_PKG_VERSION"))
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.freedesktop.MediaPlayer")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn prev(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    /// Toggle: pause when playing, resume when paused.
    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    /// Single-track repeat is not supported; accepted and ignored.
    fn repeat(&self, _repeat: bool) {}

    fn get_status(&self) -> (i32, i32, i32, i32) {
        let Ok(s) = self.state.lock() else {
            return (2, 0, 0, 0);
        };
        status_tuple(s.playback, s.random, s.repeat)
    }

    fn get_metadata(&self) -> HashMap<String, OwnedValue> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.meta.as_ref().map(metadata_map))
            .unwrap_or_default()
    }

    fn get_caps(&self) -> i32 {
        PLAYER_CAPS
    }

    fn volume_set(&self, volume: i32) {
        if !volume_in_range(volume) {
            return;
        }
        let _ = self.tx.send(ControlCmd::SetVolume(volume));
    }

    fn volume_get(&self) -> i32 {
        self.state.lock().map(|s| s.volume_pct).unwrap_or(0)
    }

    fn position_set(&self, millisec: i32) {
        let length_ms = self.state.lock().ok().and_then(|s| s.length_ms);
        if !position_acceptable(millisec as i64, length_ms) {
            return;
        }
        let _ = self.tx.send(ControlCmd::SetPosition(millisec as i64));
    }

    fn position_get(&self) -> i32 {
        self.state.lock().map(|s| s.position_ms as i32).unwrap_or(0)
    }

    #[zbus(signal)]
    async fn track_change(
        emitter: &SignalEmitter<'_>,
        metadata: HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn status_change(
        emitter: &SignalEmitter<'_>,
        status: (i32, i32, i32, i32),
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn caps_change(emitter: &SignalEmitter<'_>, caps: i32) -> zbus::Result<()>;
}

/// Runtime-side handle: update the snapshot, request signal emission.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    signals: Sender<SignalRequest>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: Option<PlaybackState>) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
    }

    pub fn set_modes(&self, random: bool, repeat: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.random = random;
            s.repeat = repeat;
        }
    }

    pub fn set_volume_pct(&self, pct: i32) {
        if let Ok(mut s) = self.state.lock() {
            s.volume_pct = pct.clamp(0, 100);
        }
    }

    pub fn set_position_ms(&self, ms: i64) {
        if let Ok(mut s) = self.state.lock() {
            s.position_ms = ms;
        }
    }

    pub fn set_track(&self, meta: Option<TrackMeta>) {
        if let Ok(mut s) = self.state.lock() {
            s.length_ms = meta
                .as_ref()
                .and_then(|m| m.length_secs)
                .map(|secs| secs as i64 * 1000);
            s.meta = meta;
        }
    }

    pub fn emit_track_change(&self) {
        let _ = self.signals.send(SignalRequest::TrackChange);
    }

    pub fn emit_status_change(&self) {
        let _ = self.signals.send(SignalRequest::StatusChange);
    }

    pub fn emit_caps_change(&self) {
        let _ = self.signals.send(SignalRequest::CapsChange);
    }
}

/// Spawn the DBus service thread. Failure to reach the session bus
/// disables remote control but not playback.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (sig_tx, sig_rx) = channel();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, sig_rx));
    });

    MprisHandle {
        state,
        signals: sig_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    sig_rx: Receiver<SignalRequest>,
) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!("mpris: failed to connect to session bus: {e}");
            return;
        }
    };

    if let Err(e) = connection.request_name(BUS_NAME).await {
        warn!("mpris: failed to acquire {BUS_NAME}: {e}");
        return;
    }

    let object_server = connection.object_server();
    if let Err(e) = object_server.at("/", RootIface { tx: tx.clone() }).await {
        warn!("mpris: failed to register root object: {e}");
        return;
    }
    if let Err(e) = object_server
        .at(
            PLAYER_PATH,
            PlayerIface {
                tx,
                state: state.clone(),
            },
        )
        .await
    {
        warn!("mpris: failed to register player object: {e}");
        return;
    }

    let emitter = match SignalEmitter::new(&connection, PLAYER_PATH) {
        Ok(e) => e,
        Err(e) => {
            warn!("mpris: failed to create signal emitter: {e}");
            return;
        }
    };

    loop {
        while let Ok(req) = sig_rx.try_recv() {
            let result = match req {
                SignalRequest::TrackChange => {
                    let map = state
                        .lock()
                        .ok()
                        .and_then(|s| s.meta.as_ref().map(metadata_map))
                        .unwrap_or_default();
                    PlayerIface::track_change(&emitter, map).await
                }
                SignalRequest::StatusChange => {
                    let status = state
                        .lock()
                        .map(|s| status_tuple(s.playback, s.random, s.repeat))
                        .unwrap_or((2, 0, 0, 0));
                    PlayerIface::status_change(&emitter, status).await
                }
                SignalRequest::CapsChange => PlayerIface::caps_change(&emitter, PLAYER_CAPS).await,
            };
            if let Err(e) = result {
                warn!("mpris: failed to emit signal: {e}");
            }
        }
        Timer::after(std::time::Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests;
