//! Converter module for transforming documents with pandoc.
//!
//! This module provides the [`DocumentBackend`] trait, the pandoc command-line
//! backend, and the [`DocumentConverter`] that orchestrates single-file and
//! batch conversions.
//!
//! # Supported conversions
//!
//! - HTML to Markdown (with post-processing of pandoc's output)
//! - Markdown to DOCX
//!
//! # Example
//!
//! ```ignore
//! use quackdoc_core::converter::{DocumentConverter, DocumentFormat, PandocCli};
//! use quackdoc_core::fs::LocalFs;
//!
//! let config = PandocConfig::default();
//! let backend = PandocCli::new(&config);
//!
//! // Fails if pandoc is not installed
//! let mut converter = DocumentConverter::new(config, backend, LocalFs::new()).await?;
//!
//! let outcome = converter
//!     .convert_file(Path::new("page.html"), Path::new("out/page.md"), &DocumentFormat::Markdown)
//!     .await?;
//! println!("{}", outcome.message);
//! ```

mod document;
mod error;
mod html_to_md;
mod md_to_docx;
mod pandoc;
mod probe;
mod structure;
mod traits;
mod types;

pub use document::DocumentConverter;
pub use error::ConverterError;
pub use html_to_md::{convert_html_to_markdown, post_process_markdown};
pub use md_to_docx::convert_markdown_to_docx;
pub use pandoc::{is_pandoc_available, prepare_pandoc_args, verify_pandoc, PandocCli};
pub use probe::{probe_file, sniff_format};
pub use structure::{
    check_conversion_ratio, check_file_size, validate_docx_structure, validate_html_structure,
};
pub use traits::DocumentBackend;
pub use types::{
    ConversionDetails, ConversionMetrics, ConversionOutcome, ConversionResult, ConversionTask,
    ConversionTiming, DocumentFormat, FileInfo, FileSizeChange, StructureReport,
};

use std::path::Path;

use crate::fs::FileSystem;

/// Creates the parent directory of `output` if it has one.
pub(crate) async fn ensure_parent_dir<F: FileSystem + ?Sized>(
    fs: &F,
    output: &Path,
) -> Result<(), ConverterError> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    fs.create_directory(parent, true)
        .await
        .map_err(|e| ConverterError::OutputDirectoryFailed {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })
}

/// File name used as the metrics key for a path.
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
