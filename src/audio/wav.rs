//! Canonical 16-bit PCM WAV serialization.
//!
//! The container is assembled byte by byte so the output is identical on
//! every platform: a 44-byte RIFF/WAVE header followed by little-endian i16
//! samples.

use std::fs;
use std::path::Path;

use super::pcm::PcmBuffer;
use crate::error::{AudioError, Result};

/// Size of the RIFF + fmt + data headers.
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = 2;

/// Encoded WAV bytes. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Vec<u8>,
    sample_rate_hz: u32,
}

impl WavContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Value of the data subchunk size field.
    pub fn data_len(&self) -> u32 {
        u32::from_le_bytes([self.bytes[40], self.bytes[41], self.bytes[42], self.bytes[43]])
    }

    /// Write the container to `path` atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("wav.tmp");
        fs::write(&tmp_path, &self.bytes)?;

        // rename() does not replace an existing file on Windows.
        if cfg!(windows) && path.exists() {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
        }

        fs::rename(&tmp_path, path)?;
        log::debug!("Saved {} byte WAV to {:?}", self.bytes.len(), path);
        Ok(())
    }
}

impl AsRef<[u8]> for WavContainer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Serialize a mono buffer as 16-bit PCM WAV.
///
/// Stereo and wider layouts are rejected before any bytes are produced.
pub fn encode(pcm: &PcmBuffer) -> Result<WavContainer> {
    if pcm.channel_count() != 1 {
        return Err(AudioError::UnsupportedChannelLayout(pcm.channel_count()));
    }

    let samples = pcm.first_channel();
    let data_len = samples
        .len()
        .checked_mul(usize::from(BLOCK_ALIGN))
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or_else(|| {
            AudioError::InvalidPcm(format!("{} frames do not fit a WAV file", samples.len()))
        })?;

    let sample_rate = pcm.sample_rate_hz();
    let byte_rate = sample_rate
        .checked_mul(u32::from(BLOCK_ALIGN))
        .ok_or_else(|| AudioError::InvalidPcm(format!("sample rate {sample_rate} too high")))?;

    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&quantize(sample).to_le_bytes());
    }

    Ok(WavContainer {
        bytes: buf,
        sample_rate_hz: sample_rate,
    })
}

/// `round(clamp(x, -1, 1) * 32767)`; NaN becomes silence.
pub(crate) fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    // f64 keeps the product exact; in f32 it can round across a .5 boundary.
    (f64::from(sample).clamp(-1.0, 1.0) * f64::from(i16::MAX)).round() as i16
}
