//! XDG path helpers for saved voice samples
//!
//! Samples are stored in: ~/.local/share/voxclip/samples/

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Get the sample directory path.
/// Returns: ~/.local/share/voxclip/samples/
pub fn samples_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxclip")
        .join("samples")
}

/// Create the sample directory if it doesn't exist.
pub fn create_samples_dir() -> std::io::Result<PathBuf> {
    let dir = samples_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Path for a new sample inside `dir`.
/// Format: <YYYYmmdd_HHMMSS>_<uuid>.wav
pub fn sample_path_in(dir: &Path, sample_id: Uuid) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.wav", timestamp, sample_id))
}

/// Delete all but the `keep` most recently modified `.wav` files in `dir`.
/// Returns the number of files removed.
pub fn prune_samples(dir: &Path, keep: usize) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "wav")
                .unwrap_or(false)
        })
        .collect();

    if entries.len() <= keep {
        return Ok(0);
    }

    // Oldest first
    entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());

    let to_delete = entries.len() - keep;
    let mut deleted = 0;

    for entry in entries.into_iter().take(to_delete) {
        if fs::remove_file(entry.path()).is_ok() {
            log::debug!("Pruned old sample: {:?}", entry.path());
            deleted += 1;
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn sample_path_contains_id() {
        let id = Uuid::new_v4();
        let path = sample_path_in(Path::new("/tmp/voxclip"), id);
        assert!(path.to_string_lossy().contains(&id.to_string()));
        assert!(path.extension().map(|e| e == "wav").unwrap_or(false));
    }

    #[test]
    fn samples_dir_contains_expected_path() {
        let path_str = samples_dir().to_string_lossy().into_owned();
        assert!(path_str.contains("voxclip"));
        assert!(path_str.contains("samples"));
    }

    #[test]
    fn prune_keeps_newest_wavs() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(100);
        for i in 0..4u64 {
            let path = dir.path().join(format!("{i}.wav"));
            let file = fs::File::create(&path).unwrap();
            file.set_modified(base + Duration::from_secs(i * 10)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        assert_eq!(prune_samples(dir.path(), 2).unwrap(), 2);
        assert!(!dir.path().join("0.wav").exists());
        assert!(!dir.path().join("1.wav").exists());
        assert!(dir.path().join("2.wav").exists());
        assert!(dir.path().join("3.wav").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn prune_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(prune_samples(&dir.path().join("absent"), 1).unwrap(), 0);
    }
}
