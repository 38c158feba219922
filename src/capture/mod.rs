//! Device capture: session lifecycle, chunk accumulation and live level.
//!
//! [`AudioCapture`] owns one session at a time. Transitions come from the
//! pure [`session::reduce`]; this module only executes the effects it
//! returns against a [`CaptureBackend`].

mod chunks;
pub mod session;
mod sink;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

pub use chunks::{AudioChunk, ChunkBuffer};
pub use session::{SessionEffect, SessionEvent, SessionId, SessionState};
pub use sink::{ActiveStream, CaptureBackend, CaptureSink};

use crate::audio::{CaptureStats, Codec, QualityPreset, RawAudio};
use crate::error::{AudioError, Result};

struct LiveStream {
    id: SessionId,
    sink: CaptureSink,
    stream: Option<Box<dyn ActiveStream>>,
    codec: Codec,
}

pub struct AudioCapture<B: CaptureBackend> {
    backend: B,
    state: SessionState,
    live: Option<LiveStream>,
    level_tx: Arc<watch::Sender<f32>>,
}

impl<B: CaptureBackend> AudioCapture<B> {
    pub fn new(backend: B) -> Self {
        let (level_tx, _) = watch::channel(0.0);
        Self {
            backend,
            state: SessionState::Idle,
            live: None,
            level_tx: Arc::new(level_tx),
        }
    }

    /// Acquire the device with the preset's constraints and begin recording.
    ///
    /// On failure the state is left as it was.
    pub fn start(&mut self, preset: QualityPreset) -> Result<SessionId> {
        let (next, effects) = session::reduce(&self.state, SessionEvent::Start { preset })?;

        for effect in effects {
            match effect {
                SessionEffect::AcquireDevice { id, constraints } => {
                    let sink = CaptureSink::new(Arc::clone(&self.level_tx));
                    let stream = match self.backend.open(&constraints, sink.clone()) {
                        Ok(stream) => stream,
                        Err(err) => {
                            sink.close();
                            log::warn!("Failed to acquire capture device: {}", err);
                            return Err(err);
                        }
                    };
                    self.live = Some(LiveStream {
                        id,
                        codec: stream.codec(),
                        sink,
                        stream: Some(stream),
                    });
                }
                SessionEffect::StartMeter { id } => {
                    self.level_tx.send_replace(0.0);
                    if let Some(live) = self.live_for(id) {
                        live.sink.set_metering(true);
                    }
                }
                other => log::warn!("Unexpected effect on start: {:?}", other),
            }
        }

        log::info!(
            "Capture {} -> recording (preset={})",
            self.state.label(),
            preset
        );
        let id = next.session_id();
        self.state = next;
        id.ok_or(AudioError::NotRecording)
    }

    /// Stop recording, release the device and return everything captured.
    pub fn stop(&mut self) -> Result<RawAudio> {
        let (next, effects) = session::reduce(&self.state, SessionEvent::Stop)?;
        let elapsed = next.elapsed();
        let mut flushed = None;

        for effect in effects {
            match effect {
                SessionEffect::StopMeter { id } => {
                    if let Some(live) = self.live_for(id) {
                        live.sink.set_metering(false);
                    }
                    self.level_tx.send_replace(0.0);
                }
                SessionEffect::ReleaseDevice { id } => {
                    if let Some(live) = self.live_for(id) {
                        if let Some(stream) = live.stream.take() {
                            stream.close();
                        }
                        live.sink.close();
                    }
                }
                SessionEffect::FlushChunks { id } => {
                    if let Some(live) = self.live.take().filter(|live| live.id == id) {
                        let drained = live.sink.drain();
                        flushed = Some(RawAudio {
                            codec: live.codec,
                            stats: CaptureStats {
                                chunk_count: drained.chunk_count,
                                analysis_frames: drained.analysis_frames,
                                byte_count: drained.bytes.len(),
                                elapsed,
                            },
                            bytes: drained.bytes,
                        });
                    }
                }
                other => log::warn!("Unexpected effect on stop: {:?}", other),
            }
        }

        self.state = next;
        let raw = flushed.ok_or(AudioError::NotRecording)?;
        log::info!(
            "Capture recording -> stopped ({:.2}s, {} chunks, {} bytes)",
            elapsed.as_secs_f64(),
            raw.stats.chunk_count,
            raw.stats.byte_count
        );
        Ok(raw)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed()
    }

    /// Receiver for live level values in `[0.0, 1.0]`. Reads 0.0 when idle.
    pub fn level_updates(&self) -> watch::Receiver<f32> {
        self.level_tx.subscribe()
    }

    pub fn current_level(&self) -> f32 {
        *self.level_tx.borrow()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn live_for(&mut self, id: SessionId) -> Option<&mut LiveStream> {
        self.live.as_mut().filter(|live| live.id == id)
    }
}

impl<B: CaptureBackend> Drop for AudioCapture<B> {
    fn drop(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.sink.close();
            if let Some(stream) = live.stream.take() {
                stream.close();
            }
            log::debug!("Capture dropped while recording; device released");
        }
    }
}
