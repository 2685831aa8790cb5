//! Output file naming and storage checks

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::CaptureError;

/// How new clip files are named when no explicit name is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileNaming {
    /// `<uuid-v4>.mp4`
    Uuid,
    /// `VID_YYYYMMDD_HHMMSS.mp4`
    Timestamp,
}

impl Default for FileNaming {
    fn default() -> Self {
        FileNaming::Uuid
    }
}

/// Where one recording is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub file_name: String,
}

impl OutputTarget {
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Fresh target named by `naming`
    pub fn generate(directory: impl Into<PathBuf>, naming: FileNaming) -> Self {
        let file_name = match naming {
            FileNaming::Uuid => format!("{}.mp4", uuid::Uuid::new_v4()),
            FileNaming::Timestamp => {
                format!("VID_{}.mp4", chrono::Local::now().format("%Y%m%d_%H%M%S"))
            }
        };
        Self::new(directory, file_name)
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Make sure `path` can be created: parent directories exist and the file opens for writing.
///
/// Leaves no file behind when the path did not exist before.
pub fn ensure_writable(path: &Path) -> Result<(), CaptureError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CaptureError::StorageUnwritable(format!(
                "cannot create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let existed = path.exists();
    OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| {
            CaptureError::StorageUnwritable(format!("cannot write {}: {}", path.display(), e))
        })?;

    if !existed {
        let _ = fs::remove_file(path);
    }
    Ok(())
}

/// Delete `path` if present; returns whether a file was removed
pub fn remove_if_exists(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Deleted {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            log::warn!("Failed to delete {}: {}", path.display(), e);
            false
        }
    }
}
