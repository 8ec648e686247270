// SPDX-License-Identifier: GPL-3.0-only

//! Storage for exported composites
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! failed save never leaves a partial file under the final name.

use crate::config::Config;
use crate::constants::export::DEFAULT_SAVE_FOLDER;
use crate::errors::StorageError;
use crate::pipelines::render::ExportedArtifact;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `~/Pictures/Photobooth`, falling back to the home or current directory
pub fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SAVE_FOLDER)
}

/// Output directory honoring the config override
pub fn output_dir(config: &Config) -> PathBuf {
    config
        .output_dir
        .clone()
        .unwrap_or_else(default_output_dir)
}

/// Write `bytes` to `dir/filename` atomically
///
/// Creates `dir` when missing. Returns the final path.
pub fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    if filename.is_empty() || Path::new(filename).file_name() != Some(std::ffi::OsStr::new(filename)) {
        return Err(StorageError::Save(format!("Invalid file name: {}", filename)));
    }
    std::fs::create_dir_all(dir).map_err(|e| StorageError::CreateDir(e.to_string()))?;

    let target = dir.join(filename);
    let temp = dir.join(format!(".{}.{}.tmp", filename, uuid::Uuid::new_v4().simple()));

    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp, &target)
    })();

    if let Err(e) = result {
        if let Err(cleanup) = std::fs::remove_file(&temp) {
            debug!(path = %temp.display(), error = %cleanup, "Temp file cleanup skipped");
        }
        warn!(path = %target.display(), error = %e, "Save failed");
        return Err(e.into());
    }

    info!(path = %target.display(), size = bytes.len(), "Saved file");
    Ok(target)
}

/// Save an exported artifact under its suggested name on a blocking worker
pub async fn save_artifact(
    dir: PathBuf,
    artifact: ExportedArtifact,
) -> Result<PathBuf, StorageError> {
    tokio::task::spawn_blocking(move || write_atomic(&dir, &artifact.filename, &artifact.bytes))
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("photobooth-storage-{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_default_dir_ends_with_folder() {
        assert!(default_output_dir().ends_with(DEFAULT_SAVE_FOLDER));
    }

    #[test]
    fn test_config_override_wins() {
        let config = Config {
            output_dir: Some(PathBuf::from("/srv/booth")),
            ..Config::default()
        };
        assert_eq!(output_dir(&config), PathBuf::from("/srv/booth"));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = scratch_dir("write");
        let path = write_atomic(&dir, "strip.png", b"data").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        let names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("strip.png")]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_path_separators_rejected() {
        let dir = scratch_dir("reject");
        assert!(matches!(
            write_atomic(&dir, "../escape.png", b"x"),
            Err(StorageError::Save(_))
        ));
        assert!(!dir.exists());
    }
}
