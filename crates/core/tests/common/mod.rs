//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use quackdoc_core::{
    converter::{ConversionTask, DocumentConverter, DocumentFormat, FileInfo},
    testing::{MemoryFs, MockBackend},
    PandocConfig,
};

/// Converter wired to an in-memory filesystem and a scriptable backend.
pub struct TestHarness {
    pub converter: DocumentConverter<MockBackend, MemoryFs>,
    pub fs: MemoryFs,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_backend(MockBackend::new()).await
    }

    pub async fn with_backend(backend: MockBackend) -> Self {
        let fs = MemoryFs::new();
        let backend = backend.with_fs(fs.clone());
        let converter = DocumentConverter::new(test_config(), backend, fs.clone())
            .await
            .expect("mock backend should verify");
        Self { converter, fs }
    }
}

/// Configuration with size heuristics relaxed for small fixtures.
pub fn test_config() -> PandocConfig {
    let mut config = PandocConfig::default().with_output_dir("/out");
    config.validation.min_file_size = 0;
    config.validation.conversion_ratio_threshold = 0.0;
    config
}

/// A task converting `path`, with the source format taken from its extension.
pub fn task(path: &str, target: DocumentFormat) -> ConversionTask {
    let path = PathBuf::from(path);
    let format = DocumentFormat::from_extension(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default(),
    );
    ConversionTask::new(
        FileInfo {
            path,
            format,
            size: 0,
            modified: None,
        },
        target,
    )
}
