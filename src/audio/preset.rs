//! Capture quality presets.
//!
//! A preset is selected as a single unit; its constraint tuple is a fixed
//! table and cannot be edited field by field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Constraints requested from the capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureConstraints {
    pub sample_rate_hz: u32,
    pub bitrate_bps: u32,
    pub channel_count: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
    Studio,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 4] = [
        QualityPreset::Low,
        QualityPreset::Medium,
        QualityPreset::High,
        QualityPreset::Studio,
    ];

    pub fn constraints(self) -> CaptureConstraints {
        match self {
            QualityPreset::Low => CaptureConstraints {
                sample_rate_hz: 16_000,
                bitrate_bps: 64_000,
                channel_count: 1,
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain: true,
            },
            QualityPreset::Medium => CaptureConstraints {
                sample_rate_hz: 22_050,
                bitrate_bps: 96_000,
                channel_count: 1,
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain: true,
            },
            QualityPreset::High => CaptureConstraints {
                sample_rate_hz: 44_100,
                bitrate_bps: 128_000,
                channel_count: 1,
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain: false,
            },
            // Studio capture keeps the signal untouched by platform DSP.
            QualityPreset::Studio => CaptureConstraints {
                sample_rate_hz: 48_000,
                bitrate_bps: 256_000,
                channel_count: 1,
                echo_cancellation: false,
                noise_suppression: false,
                auto_gain: false,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
            QualityPreset::Studio => "studio",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityPreset {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityPreset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AudioError::UnsupportedFormat(format!("unknown quality preset '{s}'")))
    }
}
