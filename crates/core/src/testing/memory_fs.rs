//! In-memory filesystem for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fs::{FileStat, FileSystem, FsError};

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory implementation of the [`FileSystem`] trait.
///
/// Clones share the same underlying storage, so a clone handed to a
/// [`MockBackend`](super::MockBackend) writes where the test can see it.
///
/// # Example
///
/// ```rust,ignore
/// use quackdoc_core::testing::MemoryFs;
///
/// let fs = MemoryFs::new();
/// fs.add_file("/in/page.html", "<html><body></body></html>").await;
///
/// // Make directory creation under /readonly fail
/// fs.fail_directory("/readonly").await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: Arc<RwLock<BTreeMap<PathBuf, MemoryFile>>>,
    dirs: Arc<RwLock<BTreeSet<PathBuf>>>,
    failing_dirs: Arc<RwLock<Vec<PathBuf>>>,
}

impl MemoryFs {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub async fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_dirs(parent).await;
        }
        self.files.write().await.insert(
            path.to_path_buf(),
            MemoryFile {
                bytes: content.as_ref().to_vec(),
                modified: Utc::now(),
            },
        );
    }

    /// Make creating `path` or anything beneath it fail.
    pub async fn fail_directory(&self, path: impl AsRef<Path>) {
        self.failing_dirs
            .write()
            .await
            .push(path.as_ref().to_path_buf());
    }

    /// Contents of a file as text, if it exists.
    pub async fn file_text(&self, path: impl AsRef<Path>) -> Option<String> {
        self.file_bytes(path)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Contents of a file, if it exists.
    pub async fn file_bytes(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .read()
            .await
            .get(path.as_ref())
            .map(|f| f.bytes.clone())
    }

    /// Whether a file exists at `path`.
    pub async fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files.read().await.contains_key(path.as_ref())
    }

    /// Whether a directory exists at `path`.
    pub async fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        path.parent().is_none() || self.dirs.read().await.contains(path)
    }

    /// All file paths, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }

    async fn insert_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.write().await;
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    fn denied(path: &Path) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("permission denied: {}", path.display()),
        )
    }
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn create_directory(&self, path: &Path, exist_ok: bool) -> Result<(), FsError> {
        if self
            .failing_dirs
            .read()
            .await
            .iter()
            .any(|failing| path.starts_with(failing))
        {
            return Err(FsError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: Self::denied(path),
            });
        }

        if self.files.read().await.contains_key(path) {
            return Err(FsError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "a file exists at this path",
                ),
            });
        }

        if self.is_dir(path).await {
            if exist_ok {
                return Ok(());
            }
            return Err(FsError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        self.insert_dirs(path).await;
        Ok(())
    }

    async fn get_file_info(&self, path: &Path) -> Result<FileStat, FsError> {
        if let Some(file) = self.files.read().await.get(path) {
            return Ok(FileStat {
                exists: true,
                is_file: true,
                is_dir: false,
                size: file.bytes.len() as u64,
                modified: Some(file.modified),
            });
        }

        if self.is_dir(path).await {
            return Ok(FileStat {
                exists: true,
                is_dir: true,
                ..FileStat::default()
            });
        }

        Ok(FileStat::missing())
    }

    async fn read_text(&self, path: &Path) -> Result<String, FsError> {
        let bytes = self.read_bytes(path).await?;
        Ok(crate::fs::decode_text(bytes))
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.file_bytes(path).await.ok_or_else(|| FsError::NotFound {
            path: path.to_path_buf(),
        })
    }

    async fn write_text(&self, path: &Path, content: &str) -> Result<u64, FsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.is_dir(parent).await {
                return Err(FsError::WriteFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "parent directory does not exist",
                    ),
                });
            }
        }

        self.files.write().await.insert(
            path.to_path_buf(),
            MemoryFile {
                bytes: content.as_bytes().to_vec(),
                modified: Utc::now(),
            },
        );
        Ok(content.len() as u64)
    }

    async fn find_files(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, FsError> {
        if !self.is_dir(dir).await {
            return Err(FsError::NotFound {
                path: dir.to_path_buf(),
            });
        }

        let pattern = Pattern::new(pattern).map_err(|e| FsError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let files = self.files.read().await;
        Ok(files
            .keys()
            .filter(|path| {
                if recursive {
                    path.starts_with(dir)
                } else {
                    path.parent() == Some(dir)
                }
            })
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| pattern.matches(n))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
