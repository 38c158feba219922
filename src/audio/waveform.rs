//! Waveform summaries for scrubbing and trim views
//!
//! A summary is a fixed number of buckets, each holding the peak magnitude
//! of a contiguous block of channel-0 samples. Peaks are used instead of RMS
//! so clipping and transients stay visible when choosing trim points.

use serde::Serialize;

use super::pcm::PcmBuffer;

/// Default number of buckets drawn by the trim view.
pub const WAVEFORM_BUCKETS: usize = 2000;

/// Fixed-length sequence of peak values in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveformSummary {
    peaks: Vec<f32>,
}

impl WaveformSummary {
    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Loudest bucket, 0.0 for an empty or silent summary.
    pub fn max_peak(&self) -> f32 {
        self.peaks.iter().copied().fold(0.0, f32::max)
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.peaks
    }
}

/// Reduce channel 0 of `pcm` to exactly `buckets` peak values.
///
/// Block size is `frame_count / buckets`; the `frame_count % buckets` samples
/// past the last full block are not summarized. With fewer frames than
/// buckets, each sample fills one bucket and the rest are 0.0.
pub fn reduce(pcm: &PcmBuffer, buckets: usize) -> WaveformSummary {
    let samples = pcm.first_channel();
    let mut peaks = vec![0.0f32; buckets];

    if buckets == 0 || samples.is_empty() {
        return WaveformSummary { peaks };
    }

    if samples.len() < buckets {
        for (peak, &sample) in peaks.iter_mut().zip(samples) {
            *peak = magnitude(sample);
        }
        return WaveformSummary { peaks };
    }

    let block_size = samples.len() / buckets;
    for (peak, block) in peaks.iter_mut().zip(samples.chunks_exact(block_size)) {
        *peak = block.iter().copied().map(magnitude).fold(0.0, f32::max);
    }

    WaveformSummary { peaks }
}

fn magnitude(sample: f32) -> f32 {
    if sample.is_nan() {
        return 0.0;
    }
    sample.abs().min(1.0)
}
