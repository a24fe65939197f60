use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::warn;

use crate::error::{PlayerError, Result};

use super::source::{self, LoadedSource};
use super::types::{EngineCmd, EngineEvent, PipelineHandle, PipelineState, SessionId};

/// Create a paused `Sink` for `src` that starts decoding at `start_at`.
fn create_sink_at(handle: &OutputStream, src: &LoadedSource, start_at: Duration) -> Result<Sink> {
    let sink = Sink::connect_new(handle.mixer());
    match src {
        LoadedSource::File(path) => {
            let file = File::open(path)?;
            let decoded = Decoder::new(BufReader::new(file))
                .map_err(|e| PlayerError::Pipeline(format!("decode {}: {e}", path.display())))?
                // `skip_duration` is the seeking primitive; Duration::ZERO is fine.
                .skip_duration(start_at);
            sink.append(decoded);
        }
        LoadedSource::Memory { name, bytes } => {
            let decoded = Decoder::new(std::io::Cursor::new(bytes.clone()))
                .map_err(|e| PlayerError::Pipeline(format!("decode {name}: {e}")))?
                .skip_duration(start_at);
            sink.append(decoded);
        }
    }
    sink.pause();
    Ok(sink)
}

pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    events: Sender<(SessionId, EngineEvent)>,
    info: PipelineHandle,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                warn!("no audio output device: {e}");
                // Stay alive so binds fail loudly instead of hanging callers.
                drain_without_device(rx, events, e.to_string());
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. Noisy here.
        let mut stream = stream;
        stream.log_on_drop(false);

        let mut current: Option<(SessionId, LoadedSource)> = None;
        let mut sink: Option<Sink> = None;
        let mut paused = true;

        // Wall-clock position tracking: accumulated elapsed plus time since
        // the last unpause.
        let mut started_at: Option<Instant> = None;
        let mut accumulated = Duration::ZERO;

        let clear = |sink: &mut Option<Sink>,
                         current: &mut Option<(SessionId, LoadedSource)>,
                         started_at: &mut Option<Instant>,
                         accumulated: &mut Duration,
                         paused: &mut bool| {
            if let Some(s) = sink.as_ref() {
                s.stop();
            }
            *sink = None;
            *current = None;
            *started_at = None;
            *accumulated = Duration::ZERO;
            *paused = true;
            if let Ok(mut i) = info.lock() {
                i.elapsed = None;
                i.playing = false;
            }
        };

        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(EngineCmd::Bind { session, uri }) => {
                    clear(
                        &mut sink,
                        &mut current,
                        &mut started_at,
                        &mut accumulated,
                        &mut paused,
                    );

                    let loaded = match source::load(&uri, session, &events) {
                        Ok(l) => l,
                        Err(e) => {
                            let _ = events.send((session, EngineEvent::Error(e.to_string())));
                            continue;
                        }
                    };

                    let found = source::probe_tags(&loaded);
                    if !found.is_empty() {
                        let _ = events.send((session, EngineEvent::TagsFound(found)));
                    }

                    let volume = info.lock().map(|i| i.volume).unwrap_or(1.0);
                    match create_sink_at(&stream, &loaded, Duration::ZERO) {
                        Ok(new_sink) => {
                            new_sink.set_volume(volume);
                            new_sink.play();
                            sink = Some(new_sink);
                            current = Some((session, loaded));
                            paused = false;
                            started_at = Some(Instant::now());
                            accumulated = Duration::ZERO;
                            if let Ok(mut i) = info.lock() {
                                i.elapsed = Some(Duration::ZERO);
                                i.playing = true;
                            }
                        }
                        Err(e) => {
                            let _ = events.send((session, EngineEvent::Error(e.to_string())));
                        }
                    }
                }

                Ok(EngineCmd::SetState(PipelineState::Playing)) => {
                    if let Some(s) = sink.as_ref() {
                        if paused {
                            s.play();
                            paused = false;
                            started_at = Some(Instant::now());
                            if let Ok(mut i) = info.lock() {
                                i.playing = true;
                            }
                        }
                    }
                }

                Ok(EngineCmd::SetState(PipelineState::Paused)) => {
                    if let Some(s) = sink.as_ref() {
                        if !paused {
                            s.pause();
                            paused = true;
                            if let Some(st) = started_at.take() {
                                accumulated += st.elapsed();
                            }
                            if let Ok(mut i) = info.lock() {
                                i.playing = false;
                            }
                        }
                    }
                }

                Ok(EngineCmd::SetState(PipelineState::Stopped)) => {
                    clear(
                        &mut sink,
                        &mut current,
                        &mut started_at,
                        &mut accumulated,
                        &mut paused,
                    );
                }

                Ok(EngineCmd::Seek(pos)) => {
                    let Some((session, loaded)) = current.as_ref() else {
                        continue;
                    };
                    if sink.is_none() {
                        continue;
                    }
                    if let Some(s) = sink.as_ref() {
                        s.stop();
                    }
                    match create_sink_at(&stream, loaded, pos) {
                        Ok(new_sink) => {
                            let volume = info.lock().map(|i| i.volume).unwrap_or(1.0);
                            new_sink.set_volume(volume);
                            if paused {
                                started_at = None;
                            } else {
                                new_sink.play();
                                started_at = Some(Instant::now());
                            }
                            sink = Some(new_sink);
                            accumulated = pos;
                            if let Ok(mut i) = info.lock() {
                                i.elapsed = Some(pos);
                            }
                        }
                        Err(e) => {
                            let session = *session;
                            let _ = events.send((session, EngineEvent::Error(e.to_string())));
                            clear(
                                &mut sink,
                                &mut current,
                                &mut started_at,
                                &mut accumulated,
                                &mut paused,
                            );
                        }
                    }
                }

                Ok(EngineCmd::SetVolume(v)) => {
                    if let Ok(mut i) = info.lock() {
                        i.volume = v;
                    }
                    if let Some(s) = sink.as_ref() {
                        s.set_volume(v);
                    }
                }

                Ok(EngineCmd::Quit) => {
                    if let Some(s) = sink.as_ref() {
                        s.stop();
                    }
                    if let Ok(mut i) = info.lock() {
                        i.playing = false;
                        i.elapsed = None;
                    }
                    break;
                }

                Err(RecvTimeoutError::Timeout) => {
                    if let Some(s) = sink.as_ref() {
                        if !paused {
                            let elapsed =
                                accumulated + started_at.map_or(Duration::ZERO, |st| st.elapsed());
                            if let Ok(mut i) = info.lock() {
                                i.elapsed = Some(elapsed);
                            }
                            // Auto-advance check: an empty sink means the
                            // decoder ran out.
                            if s.empty() {
                                let session = current.as_ref().map(|(s, _)| *s);
                                clear(
                                    &mut sink,
                                    &mut current,
                                    &mut started_at,
                                    &mut accumulated,
                                    &mut paused,
                                );
                                if let Some(session) = session {
                                    let _ = events.send((session, EngineEvent::EndOfStream));
                                }
                            }
                        }
                    }
                }

                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// Fallback loop used when no output device could be opened. Binds are
/// answered with an error event so the control thread still makes progress.
fn drain_without_device(
    rx: Receiver<EngineCmd>,
    events: Sender<(SessionId, EngineEvent)>,
    reason: String,
) {
    loop {
        match rx.recv() {
            Ok(EngineCmd::Bind { session, .. }) => {
                let _ = events.send((
                    session,
                    EngineEvent::Error(format!("no audio output device: {reason}")),
                ));
            }
            Ok(EngineCmd::Quit) | Err(_) => break,
            Ok(_) => {}
        }
    }
}
