use serde::Serialize;

use super::meter::{level, to_dbfs};
use super::pcm::PcmBuffer;

/// Analysis window for voice activity and silence detection.
const CHUNK_MS: u32 = 100;

/// A clip counts as containing voice when more than this share of chunks
/// is voiced.
const MIN_VOICED_RATIO: f32 = 0.1;

pub const DEFAULT_VOICE_THRESHOLD: f32 = 0.01;
pub const DEFAULT_SILENCE_THRESHOLD_DBFS: f32 = -40.0;

#[derive(Debug, Clone, Serialize)]
pub struct AudioInfo {
    pub duration_secs: f64,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub frame_count: usize,
    pub peak: f32,
    pub rms: f32,
}

impl AudioInfo {
    /// Levels of the mono mixdown plus buffer layout.
    pub fn of(pcm: &PcmBuffer) -> Self {
        let mixed = pcm.mixdown();
        let samples: &[f32] = &mixed;
        Self {
            duration_secs: pcm.duration_secs(),
            sample_rate_hz: pcm.sample_rate_hz(),
            channels: pcm.channel_count(),
            frame_count: pcm.frame_count(),
            peak: peak(samples),
            rms: level(samples),
        }
    }

    pub fn crest_factor(&self) -> f32 {
        if self.rms <= 0.0 {
            return f32::INFINITY;
        }
        self.peak / self.rms
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceActivity {
    pub has_voice: bool,
    pub voiced_ratio: f32,
    pub chunks_analyzed: usize,
    pub duration_secs: f64,
}

/// Energy-based voice activity over 100 ms chunks of the mono mixdown.
///
/// Samples are normalized to the clip's peak first, so `threshold` is
/// relative to the loudest point rather than to full scale.
pub fn detect_voice_activity(pcm: &PcmBuffer, threshold: f32) -> VoiceActivity {
    let mixed = pcm.mixdown();
    let samples: &[f32] = &mixed;
    let chunk_len = chunk_len(pcm.sample_rate_hz());
    let gain = match peak(samples) {
        p if p > 0.0 => 1.0 / p,
        _ => 0.0,
    };

    let mut total = 0usize;
    let mut voiced = 0usize;
    let mut scratch = Vec::with_capacity(chunk_len);
    for chunk in samples.chunks(chunk_len) {
        scratch.clear();
        scratch.extend(chunk.iter().map(|&s| s * gain));
        total += 1;
        if level(&scratch) > threshold {
            voiced += 1;
        }
    }

    let voiced_ratio = if total == 0 {
        0.0
    } else {
        voiced as f32 / total as f32
    };

    log::debug!(
        "VAD: {}/{} chunks voiced (threshold={})",
        voiced,
        total,
        threshold
    );

    VoiceActivity {
        has_voice: voiced_ratio > MIN_VOICED_RATIO,
        voiced_ratio,
        chunks_analyzed: total,
        duration_secs: pcm.duration_secs(),
    }
}

/// Start and end (in seconds) of the span between the first and last
/// 100 ms chunk at or above `threshold_dbfs`. `None` when every chunk is
/// quieter than the threshold.
pub fn silence_bounds(pcm: &PcmBuffer, threshold_dbfs: f32) -> Option<(f64, f64)> {
    let mixed = pcm.mixdown();
    let samples: &[f32] = &mixed;
    let chunk_len = chunk_len(pcm.sample_rate_hz());
    let loud = |chunk: &[f32]| to_dbfs(level(chunk)) >= threshold_dbfs;

    let first = samples.chunks(chunk_len).position(loud)?;
    let last = samples.chunks(chunk_len).rposition(loud)?;

    let rate = f64::from(pcm.sample_rate_hz());
    let start = (first * chunk_len) as f64 / rate;
    let end = ((last + 1) * chunk_len).min(samples.len()) as f64 / rate;
    Some((start, end))
}

fn chunk_len(sample_rate_hz: u32) -> usize {
    ((sample_rate_hz as usize * CHUNK_MS as usize) / 1000).max(1)
}

fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .filter(|s| !s.is_nan())
        .fold(0.0f32, |acc, s| acc.max(s.abs()))
}
