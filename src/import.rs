//! Validation of externally supplied audio files.
//!
//! Cheap checks run first: the container type (by extension, then MIME),
//! then the byte size, which must fall inside a window. Only then is the file decoded, and the decoded
//! duration checked against the allowed window.

use serde::{Deserialize, Serialize};

use crate::audio::{AudioDecoder, Codec, ContainerFormat, PcmBuffer};
use crate::error::{AudioError, Result};

pub const MAX_IMPORT_BYTES: u64 = 50 * 1024 * 1024;
/// Anything smaller cannot hold a usable clip in any supported container.
pub const MIN_IMPORT_BYTES: u64 = 1000;
pub const MIN_IMPORT_SECS: f64 = 2.0;
pub const MAX_IMPORT_SECS: f64 = 300.0;

/// Size and duration limits applied to imports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLimits {
    pub min_bytes: u64,
    pub max_bytes: u64,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            min_bytes: MIN_IMPORT_BYTES,
            max_bytes: MAX_IMPORT_BYTES,
            min_duration_secs: MIN_IMPORT_SECS,
            max_duration_secs: MAX_IMPORT_SECS,
        }
    }
}

/// Metadata of a file offered for import.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
}

impl ImportRequest {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: Some(file_name.into()),
            mime_type: None,
            size_bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }
}

/// Determine the container from the file extension, falling back to the
/// declared MIME type.
pub fn detect_format(file_name: Option<&str>, mime_type: Option<&str>) -> Option<ContainerFormat> {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| format_from_extension(ext))
        .or_else(|| mime_type.and_then(format_from_mime))
}

fn format_from_extension(ext: &str) -> Option<ContainerFormat> {
    match ext.to_ascii_lowercase().as_str() {
        "wav" => Some(ContainerFormat::Wav),
        "flac" => Some(ContainerFormat::Flac),
        "mp3" => Some(ContainerFormat::Mp3),
        _ => None,
    }
}

fn format_from_mime(mime: &str) -> Option<ContainerFormat> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => {
            Some(ContainerFormat::Wav)
        }
        "audio/flac" | "audio/x-flac" => Some(ContainerFormat::Flac),
        "audio/mpeg" | "audio/mp3" => Some(ContainerFormat::Mp3),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Importer {
    limits: ImportLimits,
}

impl Importer {
    pub fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ImportLimits {
        &self.limits
    }

    /// Format and size checks, both size bounds inclusive. Performs no
    /// decoding.
    pub fn validate(&self, request: &ImportRequest) -> Result<ContainerFormat> {
        let format = detect_format(request.file_name.as_deref(), request.mime_type.as_deref())
            .ok_or_else(|| {
                let what = request
                    .file_name
                    .as_deref()
                    .or(request.mime_type.as_deref())
                    .unwrap_or("<unnamed>");
                log::warn!("Import rejected: unsupported format ({})", what);
                AudioError::UnsupportedFormat(what.to_string())
            })?;

        if request.size_bytes > self.limits.max_bytes {
            log::warn!(
                "Import rejected: {} bytes exceeds limit {}",
                request.size_bytes,
                self.limits.max_bytes
            );
            return Err(AudioError::FileTooLarge {
                size: request.size_bytes,
                limit: self.limits.max_bytes,
            });
        }

        if request.size_bytes < self.limits.min_bytes {
            log::warn!(
                "Import rejected: {} bytes is below minimum {}",
                request.size_bytes,
                self.limits.min_bytes
            );
            return Err(AudioError::FileTooSmall {
                size: request.size_bytes,
                min: self.limits.min_bytes,
            });
        }

        Ok(format)
    }

    /// Validate, decode, then check the decoded duration.
    pub fn import(
        &self,
        request: &ImportRequest,
        bytes: &[u8],
        decoder: &dyn AudioDecoder,
    ) -> Result<PcmBuffer> {
        let format = self.validate(request)?;
        let pcm = decoder.decode(bytes, &Codec::Container(format))?;
        self.check_duration(pcm.duration_secs())?;

        log::info!(
            "Imported {} ({:.2}s, {} Hz, {} ch)",
            format,
            pcm.duration_secs(),
            pcm.sample_rate_hz(),
            pcm.channel_count()
        );
        Ok(pcm)
    }

    /// Inclusive at both ends.
    pub fn check_duration(&self, duration_secs: f64) -> Result<()> {
        let ImportLimits {
            min_duration_secs: min,
            max_duration_secs: max,
            ..
        } = self.limits;
        if (min..=max).contains(&duration_secs) {
            return Ok(());
        }
        log::warn!(
            "Import rejected: duration {:.3}s outside {}..={}",
            duration_secs,
            min,
            max
        );
        Err(AudioError::DurationOutOfBounds {
            duration: duration_secs,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BuiltinDecoder;
    use std::cell::Cell;

    struct CountingDecoder {
        calls: Cell<usize>,
    }

    impl AudioDecoder for CountingDecoder {
        fn decode(&self, _bytes: &[u8], _codec: &Codec) -> Result<PcmBuffer> {
            self.calls.set(self.calls.get() + 1);
            PcmBuffer::mono(vec![0.0; 1_000 * 3], 1_000)
        }
    }

    #[test]
    fn extension_wins_over_mime() {
        assert_eq!(
            detect_format(Some("take.FLAC"), Some("audio/mpeg")),
            Some(ContainerFormat::Flac)
        );
    }

    #[test]
    fn mime_fallback_ignores_parameters() {
        assert_eq!(
            detect_format(Some("blob"), Some("audio/wav; codecs=1")),
            Some(ContainerFormat::Wav)
        );
        assert_eq!(detect_format(None, Some("audio/mpeg")), Some(ContainerFormat::Mp3));
        assert_eq!(detect_format(Some("clip.ogg"), Some("audio/ogg")), None);
    }

    #[test]
    fn unsupported_format_is_rejected_before_size() {
        let importer = Importer::default();
        let req = ImportRequest::new("voice.ogg", u64::MAX);
        assert!(matches!(
            importer.validate(&req),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let importer = Importer::default();
        assert!(importer
            .validate(&ImportRequest::new("a.wav", MAX_IMPORT_BYTES))
            .is_ok());
        assert!(matches!(
            importer.validate(&ImportRequest::new("a.wav", MAX_IMPORT_BYTES + 1)),
            Err(AudioError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn min_size_is_inclusive() {
        let importer = Importer::default();
        assert!(importer
            .validate(&ImportRequest::new("a.wav", MIN_IMPORT_BYTES))
            .is_ok());
        assert!(matches!(
            importer.validate(&ImportRequest::new("a.wav", MIN_IMPORT_BYTES - 1)),
            Err(AudioError::FileTooSmall { size: 999, min: 1000 })
        ));
    }

    #[test]
    fn undersized_file_is_never_decoded() {
        let decoder = CountingDecoder {
            calls: Cell::new(0),
        };
        let req = ImportRequest::new("a.wav", 44);
        let err = Importer::default().import(&req, &[0; 44], &decoder).unwrap_err();
        assert_eq!(err.kind(), "file_too_small");
        assert_eq!(decoder.calls.get(), 0);
    }

    #[test]
    fn size_window_follows_custom_limits() {
        let importer = Importer::new(ImportLimits {
            min_bytes: 0,
            ..ImportLimits::default()
        });
        assert!(importer.validate(&ImportRequest::new("a.wav", 0)).is_ok());
    }

    #[test]
    fn oversized_file_is_never_decoded() {
        let decoder = CountingDecoder {
            calls: Cell::new(0),
        };
        let req = ImportRequest::new("a.mp3", MAX_IMPORT_BYTES + 1);
        assert!(Importer::default().import(&req, &[], &decoder).is_err());
        assert_eq!(decoder.calls.get(), 0);
    }

    #[test]
    fn duration_bounds_are_inclusive() {
        let importer = Importer::default();
        assert!(matches!(
            importer.check_duration(1.9),
            Err(AudioError::DurationOutOfBounds { .. })
        ));
        assert!(importer.check_duration(2.0).is_ok());
        assert!(importer.check_duration(300.0).is_ok());
        assert!(importer.check_duration(300.1).is_err());
    }

    #[test]
    fn decode_failure_is_surfaced_unchanged() {
        let req = ImportRequest::new("broken.wav", 2_048);
        let err = Importer::default()
            .import(&req, b"not riff data", &BuiltinDecoder)
            .unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailure(_)));
    }

    #[test]
    fn imports_through_custom_decoder() {
        let decoder = CountingDecoder {
            calls: Cell::new(0),
        };
        let req = ImportRequest::new("take.flac", 1_024);
        let pcm = Importer::default().import(&req, &[1, 2, 3], &decoder).unwrap();
        assert_eq!(pcm.frame_count(), 3_000);
        assert_eq!(decoder.calls.get(), 1);
    }
}
