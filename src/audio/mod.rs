//! Audio processing for voice samples
//!
//! Capture via CPAL, live level metering, waveform peaks, sample-accurate
//! trimming, and 16-bit PCM WAV encoding.

mod decode;
pub mod meter;
mod paths;
mod pcm;
mod playback;
mod preset;
mod recorder;
pub mod trim;
pub mod vad;
pub mod wav;
pub mod waveform;

pub use decode::{AudioDecoder, BuiltinDecoder, CaptureStats, Codec, ContainerFormat, RawAudio};
pub use meter::{level, level_dbfs};
pub use paths::{create_samples_dir, prune_samples, sample_path_in, samples_dir};
pub use pcm::PcmBuffer;
pub use playback::Playback;
pub use preset::{CaptureConstraints, QualityPreset};
pub use recorder::CpalBackend;
pub use trim::{trim, TrimSelection, MIN_TRIM_GAP_SECS};
pub use vad::{
    detect_voice_activity, silence_bounds, AudioInfo, VoiceActivity,
    DEFAULT_SILENCE_THRESHOLD_DBFS, DEFAULT_VOICE_THRESHOLD,
};
pub use wav::{encode, WavContainer, WAV_HEADER_LEN};
pub use waveform::{reduce, WaveformSummary, WAVEFORM_BUCKETS};
