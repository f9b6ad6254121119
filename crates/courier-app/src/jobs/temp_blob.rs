//! Per-attempt temporary file.

use std::io;
use std::path::Path;

use tempfile::TempPath;
use tracing::warn;

const TEMP_BLOB_PREFIX: &str = "push-attachment";
const TEMP_BLOB_SUFFIX: &str = ".tmp";

/// Scratch file owned by exactly one execution attempt.
///
/// The file is removed when the guard goes out of scope, so every exit path
/// of the attempt (early `?` returns included) cleans up after itself.
#[derive(Debug)]
pub struct TempBlob {
    path: TempPath,
}

impl TempBlob {
    /// Create a fresh, empty file in `dir`, creating the directory if needed.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = tempfile::Builder::new()
            .prefix(TEMP_BLOB_PREFIX)
            .suffix(TEMP_BLOB_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now, logging instead of failing when that is not possible.
    pub fn close(self) {
        let path = self.path.display().to_string();
        if let Err(err) = self.path.close() {
            warn!(path = %path, error = %err, "Failed to delete temporary attachment file");
        }
    }
}
