//! Local disk implementation of the filesystem service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use super::error::FsError;
use super::traits::{FileStat, FileSystem};

/// Filesystem service backed by `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    fn walk(dir: &Path, pattern: &glob::Pattern, recursive: bool) -> Vec<PathBuf> {
        let walker = if recursive {
            WalkDir::new(dir)
        } else {
            WalkDir::new(dir).max_depth(1)
        };

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| pattern.matches(name))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        files
    }
}

#[async_trait]
impl FileSystem for LocalFs {
    async fn create_directory(&self, path: &Path, exist_ok: bool) -> Result<(), FsError> {
        if !exist_ok && fs::metadata(path).await.is_ok() {
            return Err(FsError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        fs::create_dir_all(path)
            .await
            .map_err(|e| FsError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }

    async fn get_file_info(&self, path: &Path) -> Result<FileStat, FsError> {
        let meta = match fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FileStat::missing())
            }
            Err(e) => return Err(FsError::read_failed(path.to_path_buf(), e)),
        };

        Ok(FileStat {
            exists: true,
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
            size: if meta.is_file() { meta.len() } else { 0 },
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    async fn read_text(&self, path: &Path) -> Result<String, FsError> {
        let bytes = self.read_bytes(path).await?;
        Ok(super::decode_text(bytes))
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        fs::read(path)
            .await
            .map_err(|e| FsError::read_failed(path.to_path_buf(), e))
    }

    async fn write_text(&self, path: &Path, content: &str) -> Result<u64, FsError> {
        fs::write(path, content.as_bytes())
            .await
            .map_err(|e| FsError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(content.len() as u64)
    }

    async fn find_files(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, FsError> {
        let compiled = glob::Pattern::new(pattern).map_err(|e| FsError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        if fs::metadata(dir).await.is_err() {
            return Err(FsError::NotFound {
                path: dir.to_path_buf(),
            });
        }

        let dir = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || Self::walk(&dir, &compiled, recursive))
            .await
            .map_err(|e| FsError::Io(std::io::Error::other(e)))?;
        Ok(files)
    }
}
