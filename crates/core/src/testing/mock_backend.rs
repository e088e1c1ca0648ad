//! Mock document backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures;
use super::MemoryFs;
use crate::converter::{ConverterError, DocumentBackend, DocumentFormat};

/// A recorded backend invocation for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub input: PathBuf,
    pub from: DocumentFormat,
    pub to: DocumentFormat,
    /// Output path for file conversions, `None` for string conversions.
    pub output: Option<PathBuf>,
    pub args: Vec<String>,
}

/// Mock implementation of the [`DocumentBackend`] trait.
///
/// Provides controllable behavior for testing:
/// - Report a version or a missing binary
/// - Return canned Markdown and DOCX output
/// - Fail or panic for specific input paths
/// - Record every invocation
///
/// File conversions only produce output when a [`MemoryFs`] is attached
/// with [`MockBackend::with_fs`].
///
/// # Example
///
/// ```rust,ignore
/// use quackdoc_core::testing::{MemoryFs, MockBackend};
///
/// let fs = MemoryFs::new();
/// let backend = MockBackend::new()
///     .with_fs(fs.clone())
///     .fail_on("/in/broken.html", "unexpected end of input")
///     .panic_on("/in/crash.md");
///
/// let calls = backend.calls().await;
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    version: Option<String>,
    markdown: String,
    docx: Vec<u8>,
    fs: Option<MemoryFs>,
    failures: HashMap<PathBuf, String>,
    panics: HashSet<PathBuf>,
    calls: Arc<RwLock<Vec<BackendCall>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a working backend reporting version `3.1.2`.
    pub fn new() -> Self {
        Self {
            version: Some("3.1.2".to_string()),
            markdown: fixtures::markdown_document("Document"),
            docx: fixtures::docx_bytes(&["Document", "Converted body text."], true),
            fs: None,
            failures: HashMap::new(),
            panics: HashSet::new(),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a backend whose binary is not installed.
    pub fn missing() -> Self {
        Self {
            version: None,
            ..Self::new()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Markdown returned by string conversions.
    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = markdown.into();
        self
    }

    /// Bytes written by file conversions.
    pub fn with_docx(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.docx = bytes.into();
        self
    }

    /// Filesystem that file conversions write into.
    pub fn with_fs(mut self, fs: MemoryFs) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Fail conversions of `input` with a conversion error.
    pub fn fail_on(mut self, input: impl AsRef<Path>, message: impl Into<String>) -> Self {
        self.failures
            .insert(input.as_ref().to_path_buf(), message.into());
        self
    }

    /// Panic while converting `input`.
    pub fn panic_on(mut self, input: impl AsRef<Path>) -> Self {
        self.panics.insert(input.as_ref().to_path_buf());
        self
    }

    /// All recorded invocations, in order.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().await.clone()
    }

    async fn record(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        output: Option<&Path>,
        args: &[String],
    ) -> Result<(), ConverterError> {
        self.calls.write().await.push(BackendCall {
            input: input.to_path_buf(),
            from: from.clone(),
            to: to.clone(),
            output: output.map(Path::to_path_buf),
            args: args.to_vec(),
        });

        if self.panics.contains(input) {
            panic!("simulated pandoc crash while converting {}", input.display());
        }
        if let Some(message) = self.failures.get(input) {
            return Err(ConverterError::conversion_failed(message.clone(), None));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for MockBackend {
    fn name(&self) -> &str {
        "mock-pandoc"
    }

    async fn version(&self) -> Result<String, ConverterError> {
        self.version
            .clone()
            .ok_or_else(|| ConverterError::PandocNotFound {
                path: PathBuf::from("pandoc"),
            })
    }

    async fn convert_to_string(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        args: &[String],
    ) -> Result<String, ConverterError> {
        self.record(input, from, to, None, args).await?;
        Ok(self.markdown.clone())
    }

    async fn convert_to_file(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        output: &Path,
        args: &[String],
    ) -> Result<(), ConverterError> {
        self.record(input, from, to, Some(output), args).await?;
        if let Some(fs) = &self.fs {
            fs.add_file(output, &self.docx).await;
        }
        Ok(())
    }
}
