//! Trait definitions for the filesystem service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::FsError;

/// Metadata about a path.
///
/// A missing path is reported with `exists == false` rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub exists: bool,
    pub is_file: bool,
    pub is_dir: bool,
    /// Size in bytes (0 for directories and missing paths).
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileStat {
    /// Stat for a path that does not exist.
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Filesystem operations the conversion pipeline depends on.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates a directory and all missing parents.
    ///
    /// With `exist_ok == false` an already existing directory is an error.
    async fn create_directory(&self, path: &Path, exist_ok: bool) -> Result<(), FsError>;

    /// Returns metadata for a path.
    async fn get_file_info(&self, path: &Path) -> Result<FileStat, FsError>;

    /// Reads a file as UTF-8 text.
    async fn read_text(&self, path: &Path) -> Result<String, FsError>;

    /// Reads a file as raw bytes.
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Writes text to a file, replacing it. Returns the number of bytes written.
    async fn write_text(&self, path: &Path, content: &str) -> Result<u64, FsError>;

    /// Finds files under `dir` whose file name matches a glob pattern.
    ///
    /// Results are sorted.
    async fn find_files(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, FsError>;
}
