//! Decoded PCM audio.

use std::borrow::Cow;

use crate::error::{AudioError, Result};

/// Immutable planar PCM: one `Vec<f32>` per channel, samples in [-1.0, 1.0].
///
/// Every channel holds the same number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate_hz: u32,
}

impl PcmBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate_hz: u32) -> Result<Self> {
        if sample_rate_hz == 0 {
            return Err(AudioError::InvalidPcm("sample rate must be non-zero".into()));
        }
        let Some(first) = channels.first() else {
            return Err(AudioError::InvalidPcm("at least one channel is required".into()));
        };
        if channels.len() > usize::from(u16::MAX) {
            return Err(AudioError::InvalidPcm(format!(
                "{} channels exceeds the supported maximum",
                channels.len()
            )));
        }
        let frames = first.len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != frames) {
            return Err(AudioError::InvalidPcm(format!(
                "channel {idx} has {} frames, channel 0 has {frames}",
                ch.len()
            )));
        }
        Ok(Self {
            channels,
            sample_rate_hz,
        })
    }

    pub fn mono(samples: Vec<f32>, sample_rate_hz: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate_hz)
    }

    /// Split interleaved samples into planar channels. A trailing partial
    /// frame is dropped.
    pub fn from_interleaved(data: &[f32], channels: u16, sample_rate_hz: u32) -> Result<Self> {
        if channels == 0 {
            return Err(AudioError::InvalidPcm("channel count must be non-zero".into()));
        }
        let n = usize::from(channels);
        let frames = data.len() / n;
        let mut planar = vec![Vec::with_capacity(frames); n];
        for frame in data.chunks_exact(n) {
            for (ch, &sample) in planar.iter_mut().zip(frame) {
                ch.push(sample);
            }
        }
        Self::new(planar, sample_rate_hz)
    }

    pub fn from_i16_mono(samples: &[i16], sample_rate_hz: u32) -> Result<Self> {
        let scaled = samples
            .iter()
            .map(|&s| f32::from(s) / f32::from(i16::MAX))
            .map(|s| s.clamp(-1.0, 1.0))
            .collect();
        Self::mono(scaled, sample_rate_hz)
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel_count(&self) -> u16 {
        // Bounded at construction.
        self.channels.len() as u16
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate_hz)
    }

    pub(crate) fn first_channel(&self) -> &[f32] {
        &self.channels[0]
    }

    /// Average of all channels per frame. Borrows when already mono.
    pub(crate) fn mixdown(&self) -> Cow<'_, [f32]> {
        if self.channels.len() == 1 {
            return Cow::Borrowed(self.first_channel());
        }
        let scale = 1.0 / self.channels.len() as f32;
        let mut mixed = vec![0.0f32; self.frame_count()];
        for channel in &self.channels {
            for (acc, &sample) in mixed.iter_mut().zip(channel) {
                *acc += sample;
            }
        }
        mixed.iter_mut().for_each(|s| *s *= scale);
        Cow::Owned(mixed)
    }

    /// Downmix to a single channel by averaging.
    pub fn to_mono(&self) -> Result<Self> {
        Self::mono(self.mixdown().into_owned(), self.sample_rate_hz)
    }

    /// Linear-interpolation resample of every channel to `target_rate_hz`.
    pub fn resample(&self, target_rate_hz: u32) -> Result<Self> {
        if target_rate_hz == 0 {
            return Err(AudioError::InvalidPcm("sample rate must be non-zero".into()));
        }
        if target_rate_hz == self.sample_rate_hz {
            return Ok(self.clone());
        }
        let ratio = f64::from(target_rate_hz) / f64::from(self.sample_rate_hz);
        let channels = self
            .channels
            .iter()
            .map(|ch| resample_linear(ch, ratio))
            .collect();
        log::debug!(
            "Resampled {} Hz -> {} Hz ({} frames)",
            self.sample_rate_hz,
            target_rate_hz,
            self.frame_count()
        );
        Self::new(channels, target_rate_hz)
    }

    /// Mono at `target_rate_hz`, the layout the WAV encoder accepts.
    pub fn to_mono_at(&self, target_rate_hz: u32) -> Result<Self> {
        self.to_mono()?.resample(target_rate_hz)
    }
}

fn resample_linear(input: &[f32], ratio: f64) -> Vec<f32> {
    let output_len = (input.len() as f64 * ratio).round() as usize;
    let pad = input.last().copied().unwrap_or(0.0);

    (0..output_len)
        .map(|i| {
            let src = i as f64 / ratio;
            let idx = src.floor() as usize;
            let frac = (src - idx as f64) as f32;
            match (input.get(idx), input.get(idx + 1)) {
                (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
                (Some(&a), None) => a,
                _ => pad,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_channels() {
        let err = PcmBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 8_000).unwrap_err();
        assert!(matches!(err, AudioError::InvalidPcm(_)));
    }

    #[test]
    fn rejects_zero_rate_and_no_channels() {
        assert!(PcmBuffer::mono(vec![0.0], 0).is_err());
        assert!(PcmBuffer::new(Vec::new(), 8_000).is_err());
    }

    #[test]
    fn duration_follows_rate() {
        let pcm = PcmBuffer::mono(vec![0.0; 22_050], 44_100).unwrap();
        assert_eq!(pcm.frame_count(), 22_050);
        assert!((pcm.duration_secs() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn deinterleaves_stereo() {
        let pcm = PcmBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3], 2, 8_000).unwrap();
        assert_eq!(pcm.channel_count(), 2);
        assert_eq!(pcm.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(pcm.channel(1).unwrap(), &[-0.1, -0.2]);
    }

    #[test]
    fn to_mono_averages_channels() {
        let pcm = PcmBuffer::new(vec![vec![0.5, 1.0, 0.0], vec![-0.5, 0.0, 0.4]], 8_000).unwrap();
        let mono = pcm.to_mono().unwrap();
        assert_eq!(mono.channel_count(), 1);
        assert_eq!(mono.channel(0).unwrap(), &[0.0, 0.5, 0.2]);
        assert_eq!(mono.sample_rate_hz(), 8_000);
    }

    #[test]
    fn mono_mixdown_borrows() {
        let pcm = PcmBuffer::mono(vec![0.1, 0.2], 8_000).unwrap();
        assert!(matches!(pcm.mixdown(), Cow::Borrowed(_)));
    }

    #[test]
    fn resample_interpolates_and_scales_length() {
        let pcm = PcmBuffer::mono(vec![0.0, 1.0], 8_000).unwrap();
        let up = pcm.resample(16_000).unwrap();
        assert_eq!(up.channel(0).unwrap(), &[0.0, 0.5, 1.0, 1.0]);

        let long = PcmBuffer::mono(vec![0.25; 44_100], 44_100).unwrap();
        let down = long.resample(16_000).unwrap();
        assert_eq!(down.frame_count(), 16_000);
        assert!((down.duration_secs() - long.duration_secs()).abs() < 1e-9);
        assert!(down.channel(0).unwrap().iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn resample_same_rate_is_identity_and_zero_is_rejected() {
        let pcm = PcmBuffer::new(vec![vec![0.1; 10], vec![0.2; 10]], 22_050).unwrap();
        assert_eq!(pcm.resample(22_050).unwrap(), pcm);
        assert!(matches!(pcm.resample(0), Err(AudioError::InvalidPcm(_))));
    }

    #[test]
    fn to_mono_at_yields_encodable_layout() {
        let pcm = PcmBuffer::new(vec![vec![0.3; 4_800], vec![0.1; 4_800]], 48_000).unwrap();
        let out = pcm.to_mono_at(16_000).unwrap();
        assert_eq!(out.channel_count(), 1);
        assert_eq!(out.sample_rate_hz(), 16_000);
        assert_eq!(out.frame_count(), 1_600);
    }

    #[test]
    fn i16_full_scale_maps_to_unit() {
        let pcm = PcmBuffer::from_i16_mono(&[i16::MAX, 0, i16::MIN], 8_000).unwrap();
        assert_eq!(pcm.channel(0).unwrap(), &[1.0, 0.0, -1.0]);
    }
}
