use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use super::thread::spawn_engine_thread;
use super::types::{
    EngineCmd, EngineEvent, Pipeline, PipelineHandle, PipelineInfo, PipelineState, SessionId,
    clamp_volume,
};

/// Handle to the process-wide playback engine thread.
///
/// Commands are fire-and-forget; outcomes arrive on the event receiver
/// returned by [`PlaybackEngine::start`], tagged with session tokens.
pub struct PlaybackEngine {
    tx: Sender<EngineCmd>,
    info: PipelineHandle,
    next_session: AtomicU64,
    join: JoinHandle<()>,
}

impl PlaybackEngine {
    /// Spawn the engine thread and return the handle plus its event stream.
    pub fn start() -> (Self, Receiver<(SessionId, EngineEvent)>) {
        let (tx, rx) = channel();
        let (event_tx, event_rx) = channel();
        let info: PipelineHandle = Arc::new(Mutex::new(PipelineInfo::default()));
        let join = spawn_engine_thread(rx, event_tx, info.clone());
        (
            Self {
                tx,
                info,
                next_session: AtomicU64::new(1),
                join,
            },
            event_rx,
        )
    }

    /// Tear down the previous sink and bind `uri`. Events produced by this
    /// bind carry the returned token.
    pub fn bind(&self, uri: &str) -> SessionId {
        let session = SessionId(self.next_session.fetch_add(1, Ordering::SeqCst));
        let _ = self.tx.send(EngineCmd::Bind {
            session,
            uri: uri.to_string(),
        });
        session
    }

    pub fn set_state(&self, state: PipelineState) {
        let _ = self.tx.send(EngineCmd::SetState(state));
    }

    pub fn seek(&self, pos: Duration) {
        let _ = self.tx.send(EngineCmd::Seek(pos));
    }

    /// Current position in the bound source. Fail-soft: `None` when nothing
    /// is bound rather than a misleading zero.
    pub fn position(&self) -> Option<Duration> {
        self.info.lock().ok().and_then(|i| i.elapsed)
    }

    pub fn set_volume(&self, volume: f32) {
        let v = clamp_volume(volume);
        let _ = self.tx.send(EngineCmd::SetVolume(v));
        if let Ok(mut i) = self.info.lock() {
            i.volume = v;
        }
    }

    pub fn volume(&self) -> f32 {
        self.info.lock().map(|i| i.volume).unwrap_or(0.0)
    }

    /// Shut the engine thread down and wait for it.
    pub fn quit(self) {
        let _ = self.tx.send(EngineCmd::Quit);
        let _ = self.join.join();
    }
}

impl Pipeline for PlaybackEngine {
    fn bind(&self, uri: &str) -> SessionId {
        PlaybackEngine::bind(self, uri)
    }

    fn set_state(&self, state: PipelineState) {
        PlaybackEngine::set_state(self, state)
    }

    fn seek(&self, pos: Duration) {
        PlaybackEngine::seek(self, pos)
    }

    fn position(&self) -> Option<Duration> {
        PlaybackEngine::position(self)
    }
}
