//! Microphone capture through CPAL
//!
//! [`CpalBackend`] opens an input stream as close to the preset's sample
//! rate as the device allows, downmixes every callback buffer to mono and
//! pushes it into the session's [`CaptureSink`] as s16le plus an analysis
//! frame.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfig};

use super::decode::Codec;
use super::preset::CaptureConstraints;
use crate::capture::{ActiveStream, CaptureBackend, CaptureSink};
use crate::error::{AudioError, Result};

/// Capture backend for the host's audio system.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    /// Use the default input device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer the input device with this name; falls back to the default
    /// device when it is not present.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    /// Names of all available input devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(device_error)?;
        Ok(devices.filter_map(|device| device.name().ok()).collect())
    }

    fn select_device(&self) -> Result<Device> {
        let host = cpal::default_host();

        if let Some(wanted) = self.device_name.as_deref() {
            let found = host
                .input_devices()
                .map_err(device_error)?
                .find(|device| device.name().map(|n| n == wanted).unwrap_or(false));
            match found {
                Some(device) => return Ok(device),
                None => log::warn!("Input device '{}' not found, using default", wanted),
            }
        }

        host.default_input_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no audio input device found".into()))
    }
}

impl CaptureBackend for CpalBackend {
    fn open(
        &mut self,
        constraints: &CaptureConstraints,
        sink: CaptureSink,
    ) -> Result<Box<dyn ActiveStream>> {
        let device = self.select_device()?;
        log::info!(
            "Using audio input device: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".into())
        );

        let supported = negotiate_config(&device, constraints)?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        log::info!(
            "Audio config: {} Hz, {} channels, {:?} (requested {} Hz)",
            config.sample_rate.0,
            config.channels,
            sample_format,
            constraints.sample_rate_hz
        );
        log::debug!(
            "Platform processing is advisory here (echo_cancellation={}, noise_suppression={}, auto_gain={})",
            constraints.echo_cancellation,
            constraints.noise_suppression,
            constraints.auto_gain
        );

        let stream = match sample_format {
            SampleFormat::I16 => build_stream_typed::<i16>(&device, &config, sink),
            SampleFormat::U16 => build_stream_typed::<u16>(&device, &config, sink),
            SampleFormat::F32 => build_stream_typed::<f32>(&device, &config, sink),
            other => Err(AudioError::DeviceUnavailable(format!(
                "unsupported sample format {:?}",
                other
            ))),
        }?;

        stream.play().map_err(device_error)?;

        Ok(Box::new(CpalStream {
            stream,
            codec: Codec::PcmS16Le {
                sample_rate_hz: config.sample_rate.0,
                channels: 1,
            },
        }))
    }
}

struct CpalStream {
    stream: Stream,
    codec: Codec,
}

impl ActiveStream for CpalStream {
    fn codec(&self) -> Codec {
        self.codec
    }

    fn close(self: Box<Self>) {
        if let Err(e) = self.stream.pause() {
            log::debug!("Failed to pause input stream before release: {}", e);
        }
        // Dropping the stream joins the callback.
        drop(self.stream);
        log::info!("Audio input stream released");
    }
}

/// Pick a supported config at the requested rate, preferring fewer channels
/// and float samples. Falls back to the device default rate.
fn negotiate_config(
    device: &Device,
    constraints: &CaptureConstraints,
) -> Result<SupportedStreamConfig> {
    let wanted = cpal::SampleRate(constraints.sample_rate_hz);

    let best = device
        .supported_input_configs()
        .map_err(device_error)?
        .filter(|range| format_rank(range.sample_format()).is_some())
        .filter(|range| range.min_sample_rate() <= wanted && wanted <= range.max_sample_rate())
        .min_by_key(|range| (range.channels(), format_rank(range.sample_format())));

    if let Some(range) = best {
        return Ok(range.with_sample_rate(wanted));
    }

    let fallback = device.default_input_config().map_err(device_error)?;
    log::warn!(
        "Device does not support {} Hz; using {} Hz",
        constraints.sample_rate_hz,
        fallback.sample_rate().0
    );
    Ok(fallback)
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::F32 => Some(0),
        SampleFormat::I16 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

fn build_stream_typed<T>(device: &Device, config: &StreamConfig, sink: CaptureSink) -> Result<Stream>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    let mut mono = Vec::new();

    let err_fn = |err: cpal::StreamError| log::error!("Audio stream error: {}", err);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                mono.clear();
                append_downmixed_samples(&mut mono, data, channels, |sample| {
                    cpal::Sample::from_sample(sample)
                });
                sink.push_samples(&mono);
            },
            err_fn,
            None,
        )
        .map_err(device_error)
}

/// Average each interleaved frame down to one sample. A trailing partial
/// frame is averaged over what it has.
fn append_downmixed_samples<T, F>(buf: &mut Vec<f32>, data: &[T], channels: usize, mut convert: F)
where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    for frame in data.chunks(channels) {
        let sum: f32 = frame.iter().copied().map(&mut convert).sum();
        buf.push(sum / frame.len() as f32);
    }
}

/// Permission problems are reported distinctly so the caller can ask the
/// user to grant microphone access.
fn device_error(err: impl std::fmt::Display) -> AudioError {
    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    let denied = ["permission", "denied", "not authorized", "not permitted"]
        .iter()
        .any(|needle| lower.contains(needle));
    if denied {
        AudioError::AcquisitionDenied(message)
    } else {
        AudioError::DeviceUnavailable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_frames() {
        let mut out = Vec::new();
        append_downmixed_samples(&mut out, &[1.0f32, 0.0, 0.5, 0.5, -1.0], 2, |s| s);
        assert_eq!(out, vec![0.5, 0.5, -1.0]);
    }

    #[test]
    fn mono_passes_through_with_conversion() {
        let mut out = Vec::new();
        append_downmixed_samples(&mut out, &[i16::MAX, 0], 1, |s| {
            cpal::Sample::from_sample(s)
        });
        assert!((out[0] - 1.0).abs() < 1e-3);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn permission_errors_are_acquisition_denied() {
        assert!(matches!(
            device_error("Permission denied by the system"),
            AudioError::AcquisitionDenied(_)
        ));
        assert!(matches!(
            device_error("The requested device is no longer available"),
            AudioError::DeviceUnavailable(_)
        ));
    }

    #[test]
    fn float_formats_rank_first() {
        assert!(format_rank(SampleFormat::F32) < format_rank(SampleFormat::I16));
        assert_eq!(format_rank(SampleFormat::U8), None);
    }
}
