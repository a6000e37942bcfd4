//! Temporary directories for cache tests.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary cache root, removed on drop.
pub struct TempCacheDir {
    dir: TempDir,
}

impl TempCacheDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::Builder::new()
                .prefix("tile-cache-")
                .tempdir()
                .expect("failed to create temp cache dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A not-yet-existing subdirectory, for testing directory creation.
    pub fn nested(&self, name: &str) -> PathBuf {
        self.dir.path().join(name).join("tiles")
    }

    /// Names of all files currently in the cache root, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("failed to read temp cache dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TempCacheDir {
    fn default() -> Self {
        Self::new()
    }
}
