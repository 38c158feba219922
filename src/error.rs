//! Error taxonomy for the capture / analysis / encoding pipeline.
//!
//! Every failure is a distinct variant so callers can render a precise
//! message ("audio too short" vs "microphone permission denied").

use thiserror::Error;

/// Errors produced by any stage of the pipeline.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("microphone access denied: {0}")]
    AcquisitionDenied(String),

    #[error("no usable capture device: {0}")]
    DeviceUnavailable(String),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("invalid trim range {start:.3}s..{end:.3}s")]
    InvalidRange { start: f64, end: f64 },

    #[error("unsupported channel layout: {0} channels (expected mono)")]
    UnsupportedChannelLayout(u16),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("file too small: {size} bytes (minimum {min} bytes)")]
    FileTooSmall { size: u64, min: u64 },

    #[error("audio duration {duration:.2}s outside {min:.1}s..={max:.1}s")]
    DurationOutOfBounds { duration: f64, min: f64, max: f64 },

    #[error("failed to decode audio: {0}")]
    DecodeFailure(String),

    #[error("invalid PCM buffer: {0}")]
    InvalidPcm(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Stable label for the error kind, suitable for UI message lookup.
    pub fn kind(&self) -> &'static str {
        match self {
            AudioError::AcquisitionDenied(_) => "acquisition_denied",
            AudioError::DeviceUnavailable(_) => "device_unavailable",
            AudioError::AlreadyRecording => "already_recording",
            AudioError::NotRecording => "not_recording",
            AudioError::InvalidRange { .. } => "invalid_range",
            AudioError::UnsupportedChannelLayout(_) => "unsupported_channel_layout",
            AudioError::UnsupportedFormat(_) => "unsupported_format",
            AudioError::FileTooLarge { .. } => "file_too_large",
            AudioError::FileTooSmall { .. } => "file_too_small",
            AudioError::DurationOutOfBounds { .. } => "duration_out_of_bounds",
            AudioError::DecodeFailure(_) => "decode_failure",
            AudioError::InvalidPcm(_) => "invalid_pcm",
            AudioError::Io(_) => "io",
        }
    }
}

pub type Result<T, E = AudioError> = std::result::Result<T, E>;
