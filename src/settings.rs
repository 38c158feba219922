//! Optional host-side preferences.
//!
//! Nothing in the capture, analysis or encoding path reads this file. Hosts
//! load it and pass the values they care about into the core types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::{QualityPreset, DEFAULT_VOICE_THRESHOLD, MIN_TRIM_GAP_SECS, WAVEFORM_BUCKETS};
use crate::import::ImportLimits;

const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Preset used when the caller does not pick one.
    pub default_preset: QualityPreset,

    /// Number of peaks computed for waveform display.
    pub waveform_buckets: usize,

    /// Smallest trim selection the editor allows, in seconds.
    pub min_trim_gap_secs: f64,

    pub import: ImportLimits,

    /// Saved samples beyond this count are pruned, oldest first.
    pub keep_recent_samples: usize,

    /// Peak-relative RMS above which a 100 ms chunk counts as voiced.
    pub voice_activity_threshold: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            default_preset: QualityPreset::default(),
            waveform_buckets: WAVEFORM_BUCKETS,
            min_trim_gap_secs: MIN_TRIM_GAP_SECS,
            import: ImportLimits::default(),
            keep_recent_samples: 20,
            voice_activity_threshold: DEFAULT_VOICE_THRESHOLD,
        }
    }
}

/// ~/.config/voxclip/settings.json on Linux.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxclip")
        .join(SETTINGS_FILE_NAME)
}

/// Missing, unreadable or malformed files all yield defaults.
pub fn load_settings(path: &Path) -> CaptureSettings {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<CaptureSettings>(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}: {}", path, e);
                CaptureSettings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CaptureSettings::default(),
        Err(e) => {
            log::warn!("Settings: failed to read {:?}: {}", path, e);
            CaptureSettings::default()
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SettingsError {
    let path = path.to_path_buf();
    move |source| SettingsError::Io { path, source }
}

pub fn save_settings(path: &Path, settings: &CaptureSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let contents = serde_json::to_string_pretty(settings)?;

    // Write to a sibling temp file, then rename over the target.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents).map_err(io_err(&tmp_path))?;

    // Windows rename fails if the destination exists.
    if cfg!(windows) && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(io_err(path)(e));
            }
        }
    }

    std::fs::rename(&tmp_path, path).map_err(io_err(path))?;
    log::debug!("Settings saved to {:?}", path);
    Ok(())
}
