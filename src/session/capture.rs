use crate::utils::ScanError;
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Owning handle to a captured photograph on disk.
///
/// The file is deleted when the handle is dropped, so a capture can never
/// outlive the session step that holds it.
#[derive(Debug)]
pub struct CapturedImage {
    path: PathBuf,
}

impl CapturedImage {
    /// Take ownership of an existing file. It will be deleted on drop.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CapturedImage { path: path.into() }
    }

    /// Copy `source` into `dir` under a fresh name and own the copy, leaving the
    /// original untouched.
    pub fn stage(source: &Path, dir: &Path) -> Result<Self, ScanError> {
        let suffix = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let staged = tempfile::Builder::new()
            .prefix("guest_doc_")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| ScanError::IoError(format!("Failed to create capture file in {}: {}", dir.display(), e)))?
            .into_temp_path()
            .keep()
            .map_err(|e| ScanError::IoError(format!("Failed to keep capture file: {}", e)))?;

        // From here on the handle owns the file, including on the error path below.
        let capture = CapturedImage::new(staged);
        std::fs::copy(source, &capture.path)
            .map_err(|e| ScanError::IoError(format!("Failed to copy {}: {}", source.display(), e)))?;

        debug!("Staged capture {} -> {}", source.display(), capture.path.display());
        Ok(capture)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CapturedImage {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Deleted capture {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete capture {}: {}", self.path.display(), e),
        }
    }
}
