//! Voice sample capture and editing.
//!
//! Records from a microphone with a [`QualityPreset`], publishes a live
//! level while recording, and turns the result into trimmed 16-bit mono WAV.
//! Decoding of compressed imports is left to an [`AudioDecoder`] supplied by
//! the host.
//!
//! ```no_run
//! use voxclip::{AudioCapture, BuiltinDecoder, CpalBackend, QualityPreset, TrimSelection};
//!
//! # fn main() -> voxclip::Result<()> {
//! let mut capture = AudioCapture::new(CpalBackend::new());
//! capture.start(QualityPreset::High)?;
//! // ... later
//! let raw = capture.stop()?;
//! let pcm = raw.decode_with(&BuiltinDecoder)?;
//! let selection = TrimSelection::full(&pcm)?;
//! let wav = voxclip::encode(&voxclip::trim(&pcm, selection)?)?;
//! # let _ = wav;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod capture;
pub mod error;
pub mod import;
pub mod settings;

pub use audio::{
    encode, level, reduce, trim, AudioDecoder, BuiltinDecoder, CaptureConstraints, Codec,
    ContainerFormat, CpalBackend, PcmBuffer, Playback, QualityPreset, RawAudio, TrimSelection,
    WavContainer, WaveformSummary,
};
pub use capture::{AudioCapture, CaptureBackend, CaptureSink, SessionId, SessionState};
pub use error::{AudioError, Result};
pub use import::{ImportLimits, ImportRequest, Importer};
pub use settings::{CaptureSettings, SettingsError};
