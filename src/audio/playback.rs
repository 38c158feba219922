//! Clip playback through the default output device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

use super::pcm::PcmBuffer;
use crate::error::{AudioError, Result};

struct PlayingClip {
    _stream: Stream,
    finished: Arc<AtomicBool>,
}

/// Plays at most one clip at a time. Starting a clip stops the previous one.
pub struct Playback {
    device: Device,
    current: Option<PlayingClip>,
}

impl Playback {
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no audio output device found".into()))?;
        log::info!(
            "Using audio output device: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".into())
        );
        Ok(Self {
            device,
            current: None,
        })
    }

    /// Play channel 0 of `pcm`, duplicated to every output channel.
    pub fn play(&mut self, pcm: &PcmBuffer) -> Result<()> {
        self.stop();

        let config = self.output_config(pcm.sample_rate_hz())?;
        let channels = usize::from(config.channels.max(1));
        let samples: Arc<[f32]> = Arc::from(pcm.first_channel());
        let finished = Arc::new(AtomicBool::new(samples.is_empty()));

        let done = Arc::clone(&finished);
        let mut position = 0usize;
        let stream = self
            .device
            .build_output_stream(
                &config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in out.chunks_mut(channels) {
                        let sample = match samples.get(position) {
                            Some(&s) => {
                                position += 1;
                                s
                            }
                            None => {
                                done.store(true, Ordering::SeqCst);
                                0.0
                            }
                        };
                        frame.fill(sample);
                    }
                },
                |err| log::error!("Audio output error: {}", err),
                None,
            )
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        log::debug!(
            "Playing {:.2}s clip at {} Hz",
            pcm.duration_secs(),
            pcm.sample_rate_hz()
        );
        self.current = Some(PlayingClip {
            _stream: stream,
            finished,
        });
        Ok(())
    }

    /// Stop the current clip, if any.
    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            log::debug!("Playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|clip| !clip.finished.load(Ordering::SeqCst))
    }

    fn output_config(&self, sample_rate_hz: u32) -> Result<StreamConfig> {
        let wanted = cpal::SampleRate(sample_rate_hz);
        self.device
            .supported_output_configs()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?
            .filter(|range| range.sample_format() == SampleFormat::F32)
            .filter(|range| range.min_sample_rate() <= wanted && wanted <= range.max_sample_rate())
            .min_by_key(|range| range.channels())
            .map(|range| range.with_sample_rate(wanted).config())
            .ok_or_else(|| {
                AudioError::DeviceUnavailable(format!(
                    "output device cannot play {} Hz float audio",
                    sample_rate_hz
                ))
            })
    }
}
