//! Seam between the platform audio callback and the capture session.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use super::chunks::ChunkBuffer;
use crate::audio::{meter, wav, CaptureConstraints, Codec};
use crate::error::Result;

/// Opens a capture stream on some device.
///
/// Implementations hand `sink` to their callback context; the stream runs
/// until [`ActiveStream::close`] is called.
pub trait CaptureBackend {
    fn open(
        &mut self,
        constraints: &CaptureConstraints,
        sink: CaptureSink,
    ) -> Result<Box<dyn ActiveStream>>;
}

/// A running device stream.
pub trait ActiveStream {
    /// Format of the bytes this stream pushes into its sink.
    fn codec(&self) -> Codec;

    /// Stop the stream and release the device. Returns once the platform
    /// callback can no longer run.
    fn close(self: Box<Self>);
}

#[derive(Debug, Default)]
struct SinkState {
    accepting: bool,
    metering: bool,
    chunks: ChunkBuffer,
    analysis_frames: usize,
    ignored_calls: usize,
}

/// Cloneable handle given to platform callbacks.
///
/// Every push takes the same lock the session uses to close the sink, so
/// nothing lands (and no level is published) after the close returns.
#[derive(Debug, Clone)]
pub struct CaptureSink {
    state: Arc<Mutex<SinkState>>,
    level_tx: Arc<watch::Sender<f32>>,
}

impl CaptureSink {
    pub(crate) fn new(level_tx: Arc<watch::Sender<f32>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                accepting: true,
                ..SinkState::default()
            })),
            level_tx,
        }
    }

    /// Append one block of already encoded bytes.
    pub fn push_chunk(&self, bytes: Vec<u8>) {
        let mut state = lock(&self.state);
        if !state.accepting {
            state.ignored_calls += 1;
            log::debug!("Dropping chunk after capture closed ({} bytes)", bytes.len());
            return;
        }
        state.chunks.push(bytes);
    }

    /// Feed one analysis frame to the level meter.
    pub fn push_analysis_frame(&self, frame: &[f32]) {
        let mut state = lock(&self.state);
        if !state.accepting || !state.metering {
            state.ignored_calls += 1;
            log::debug!("Ignoring analysis frame outside an active meter");
            return;
        }
        state.analysis_frames += 1;
        self.level_tx.send_replace(meter::level(frame));
    }

    /// Mono f32 samples from the device: stored as s16le and metered.
    pub fn push_samples(&self, samples: &[f32]) {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for &sample in samples {
            bytes.extend_from_slice(&wav::quantize(sample).to_le_bytes());
        }
        self.push_chunk(bytes);
        self.push_analysis_frame(samples);
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).accepting
    }

    pub(crate) fn set_metering(&self, enabled: bool) {
        lock(&self.state).metering = enabled;
    }

    /// Stop accepting pushes. Idempotent.
    pub(crate) fn close(&self) {
        let mut state = lock(&self.state);
        state.accepting = false;
        state.metering = false;
    }

    /// Take the accumulated chunks, leaving the sink closed and empty.
    pub(crate) fn drain(&self) -> DrainedChunks {
        let mut state = lock(&self.state);
        state.accepting = false;
        state.metering = false;
        if state.ignored_calls > 0 {
            log::debug!("{} callbacks ignored after close", state.ignored_calls);
        }
        let chunks = std::mem::take(&mut state.chunks);
        DrainedChunks {
            chunk_count: chunks.len(),
            analysis_frames: std::mem::take(&mut state.analysis_frames),
            bytes: chunks.into_bytes(),
        }
    }
}

pub(crate) struct DrainedChunks {
    pub bytes: Vec<u8>,
    pub chunk_count: usize,
    pub analysis_frames: usize,
}

/// The callback thread may have panicked mid-push; the chunk list is still
/// append-only, so keep using it.
fn lock(state: &Mutex<SinkState>) -> MutexGuard<'_, SinkState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
