//! Sample-accurate trimming of decoded PCM.

use super::pcm::PcmBuffer;
use crate::error::{AudioError, Result};

/// Shortest selection that may be trimmed out of a buffer.
pub const MIN_TRIM_GAP_SECS: f64 = 0.5;

/// A validated `[start, end)` time range over a buffer of known duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimSelection {
    start_secs: f64,
    end_secs: f64,
}

impl TrimSelection {
    /// Validate `0 <= start < end <= duration` with at least
    /// [`MIN_TRIM_GAP_SECS`] between the two points.
    pub fn new(start_secs: f64, end_secs: f64, duration_secs: f64) -> Result<Self> {
        Self::with_min_gap(start_secs, end_secs, duration_secs, MIN_TRIM_GAP_SECS)
    }

    pub fn with_min_gap(
        start_secs: f64,
        end_secs: f64,
        duration_secs: f64,
        min_gap_secs: f64,
    ) -> Result<Self> {
        let valid = start_secs.is_finite()
            && end_secs.is_finite()
            && start_secs >= 0.0
            && start_secs < end_secs
            && end_secs <= duration_secs
            && end_secs - start_secs >= min_gap_secs;
        if !valid {
            return Err(AudioError::InvalidRange {
                start: start_secs,
                end: end_secs,
            });
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    /// Selection covering the whole of `pcm`.
    pub fn full(pcm: &PcmBuffer) -> Result<Self> {
        Self::new(0.0, pcm.duration_secs(), pcm.duration_secs())
    }

    pub fn start_secs(&self) -> f64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.end_secs
    }

    pub fn length_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// `(floor(start * rate), floor(end * rate))`.
    ///
    /// Times that came from a frame index (`frames / rate`) map back to that
    /// exact index even when the division left them an ulp short.
    pub fn sample_bounds(&self, sample_rate_hz: u32) -> (i64, i64) {
        let rate = f64::from(sample_rate_hz);
        (
            secs_to_frame(self.start_secs, rate),
            secs_to_frame(self.end_secs, rate),
        )
    }
}

fn secs_to_frame(secs: f64, rate: f64) -> i64 {
    let exact = secs * rate;
    let nearest = exact.round();
    if (exact - nearest).abs() <= nearest.abs().max(1.0) * FRAME_SNAP_EPSILON {
        nearest as i64
    } else {
        exact.floor() as i64
    }
}

/// A few ulps of relative error: one for the division, one for the multiply.
const FRAME_SNAP_EPSILON: f64 = 4.0 * f64::EPSILON;

/// Copy the selected range of every channel into a new buffer.
///
/// The sample bounds are re-checked against `pcm` even though the selection
/// was validated when built; a selection made for another buffer fails here
/// with `InvalidRange` and nothing is allocated.
pub fn trim(pcm: &PcmBuffer, selection: TrimSelection) -> Result<PcmBuffer> {
    let (start, end) = selection.sample_bounds(pcm.sample_rate_hz());
    let frames = pcm.frame_count() as i64;
    if start < 0 || end <= start || end > frames {
        return Err(AudioError::InvalidRange {
            start: selection.start_secs,
            end: selection.end_secs,
        });
    }

    let (start, end) = (start as usize, end as usize);
    let channels = pcm.channels().map(|ch| ch[start..end].to_vec()).collect();

    log::debug!(
        "Trimmed {:.3}s..{:.3}s -> {} frames",
        selection.start_secs,
        selection.end_secs,
        end - start
    );
    PcmBuffer::new(channels, pcm.sample_rate_hz())
}
