//! Raw captured bytes and the decoder seam.
//!
//! Demuxing compressed containers is the host's job; it plugs a codec in
//! through [`AudioDecoder`]. [`BuiltinDecoder`] covers what this crate
//! produces itself (raw s16le capture chunks) and plain WAV files.

use std::fmt;
use std::io::Cursor;
use std::time::Duration;

use hound::{SampleFormat, WavReader};

use super::pcm::PcmBuffer;
use crate::error::{AudioError, Result};

/// Container types accepted for import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Wav,
    Flac,
    Mp3,
}

impl ContainerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerFormat::Wav => "wav",
            ContainerFormat::Flac => "flac",
            ContainerFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a byte buffer contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Interleaved little-endian i16, as negotiated with the capture device.
    PcmS16Le { sample_rate_hz: u32, channels: u16 },
    Container(ContainerFormat),
}

/// Counters gathered while a session was recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub chunk_count: usize,
    pub analysis_frames: usize,
    pub byte_count: usize,
    pub elapsed: Duration,
}

/// Bytes handed over by a stopped capture session, tagged with their codec.
#[derive(Debug, Clone)]
pub struct RawAudio {
    pub bytes: Vec<u8>,
    pub codec: Codec,
    pub stats: CaptureStats,
}

impl RawAudio {
    pub fn decode_with(&self, decoder: &dyn AudioDecoder) -> Result<PcmBuffer> {
        decoder.decode(&self.bytes, &self.codec)
    }
}

/// Turns encoded bytes into PCM. Failures surface as `DecodeFailure`.
pub trait AudioDecoder {
    fn decode(&self, bytes: &[u8], codec: &Codec) -> Result<PcmBuffer>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDecoder;

impl AudioDecoder for BuiltinDecoder {
    fn decode(&self, bytes: &[u8], codec: &Codec) -> Result<PcmBuffer> {
        match *codec {
            Codec::PcmS16Le {
                sample_rate_hz,
                channels,
            } => decode_s16le(bytes, sample_rate_hz, channels),
            Codec::Container(ContainerFormat::Wav) => decode_wav(bytes),
            Codec::Container(other) => Err(AudioError::DecodeFailure(format!(
                "no {other} decoder available; supply one through AudioDecoder"
            ))),
        }
    }
}

fn decode_s16le(bytes: &[u8], sample_rate_hz: u32, channels: u16) -> Result<PcmBuffer> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::DecodeFailure(format!(
            "odd byte count {} for 16-bit PCM",
            bytes.len()
        )));
    }
    let interleaved: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .map(|s| (f32::from(s) / f32::from(i16::MAX)).max(-1.0))
        .collect();
    PcmBuffer::from_interleaved(&interleaved, channels, sample_rate_hz)
        .map_err(|e| AudioError::DecodeFailure(e.to_string()))
}

fn decode_wav(bytes: &[u8]) -> Result<PcmBuffer> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::DecodeFailure(format!("read WAV header: {e}")))?;
    let spec = reader.spec();

    log::debug!(
        "WAV spec channels={}, sample_rate={}Hz, bits_per_sample={}, format={:?}",
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| AudioError::DecodeFailure(format!("read WAV sample: {e}")))?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (v as f32 / scale).clamp(-1.0, 1.0)))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AudioError::DecodeFailure(format!("read WAV sample: {e}")))?
        }
        (format, bits) => {
            return Err(AudioError::DecodeFailure(format!(
                "unsupported WAV encoding {format:?} at {bits} bits"
            )))
        }
    };

    PcmBuffer::from_interleaved(&interleaved, spec.channels, spec.sample_rate)
        .map_err(|e| AudioError::DecodeFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav;

    #[test]
    fn decodes_raw_capture_bytes() {
        let bytes: Vec<u8> = [0i16, i16::MAX, -i16::MAX, 16_384]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let codec = Codec::PcmS16Le {
            sample_rate_hz: 16_000,
            channels: 1,
        };
        let pcm = BuiltinDecoder.decode(&bytes, &codec).unwrap();
        assert_eq!(pcm.frame_count(), 4);
        assert_eq!(pcm.channel(0).unwrap()[..3], [0.0, 1.0, -1.0]);
    }

    #[test]
    fn odd_raw_length_is_a_decode_failure() {
        let codec = Codec::PcmS16Le {
            sample_rate_hz: 16_000,
            channels: 1,
        };
        let err = BuiltinDecoder.decode(&[0, 0, 0], &codec).unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailure(_)));
    }

    #[test]
    fn decodes_own_wav_output() {
        let pcm = PcmBuffer::mono(vec![0.5; 1_000], 22_050).unwrap();
        let bytes = wav::encode(&pcm).unwrap().into_bytes();
        let back = BuiltinDecoder
            .decode(&bytes, &Codec::Container(ContainerFormat::Wav))
            .unwrap();
        assert_eq!(back.frame_count(), 1_000);
        assert_eq!(back.sample_rate_hz(), 22_050);
        assert!(back.channel(0).unwrap().iter().all(|s| (s - 0.5).abs() < 1e-4));
    }

    #[test]
    fn decodes_stereo_float_wav() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..10 {
                writer.write_sample(0.25f32).unwrap();
                writer.write_sample(-0.25f32).unwrap();
            }
            writer.finalize().unwrap();
        }
        let pcm = BuiltinDecoder
            .decode(cursor.get_ref(), &Codec::Container(ContainerFormat::Wav))
            .unwrap();
        assert_eq!(pcm.channel_count(), 2);
        assert_eq!(pcm.frame_count(), 10);
        assert_eq!(pcm.channel(1).unwrap()[0], -0.25);
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let err = BuiltinDecoder
            .decode(b"not a wav", &Codec::Container(ContainerFormat::Wav))
            .unwrap_err();
        assert_eq!(err.kind(), "decode_failure");
    }

    #[test]
    fn compressed_formats_need_a_host_decoder() {
        let err = BuiltinDecoder
            .decode(&[0xFF, 0xFB], &Codec::Container(ContainerFormat::Mp3))
            .unwrap_err();
        assert!(err.to_string().contains("mp3"));
    }
}
