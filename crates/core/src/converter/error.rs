//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::DocumentFormat;
use crate::fs::FsError;

/// Number of failed paths listed in a batch failure message.
const LISTED_FAILURES: usize = 5;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Pandoc binary not found.
    #[error("Pandoc is not installed or not found at path: {path}")]
    PandocNotFound { path: PathBuf },

    /// Pandoc was found but could not be used.
    #[error("Pandoc integration unavailable: {reason}")]
    IntegrationUnavailable { reason: String },

    /// Input file not found.
    #[error("File not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input is not a directory.
    #[error("Input directory does not exist or is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// No files in a directory matched the pattern.
    #[error("No matching files found in {dir}")]
    NoMatchingFiles { dir: PathBuf },

    /// No conversion routine for this format pair.
    #[error("Unsupported conversion: {from} to {to}")]
    UnsupportedConversion {
        from: DocumentFormat,
        to: DocumentFormat,
    },

    /// Target format not supported for directory conversion.
    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: DocumentFormat },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory {path}: {reason}")]
    OutputDirectoryFailed { path: PathBuf, reason: String },

    /// Input document failed its structural check.
    #[error("Invalid document structure in {path}: {reason}")]
    InvalidStructure { path: PathBuf, reason: String },

    /// Conversion process failed.
    #[error("Pandoc conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Converted output failed validation.
    #[error("Conversion validation failed: {}", errors.join("; "))]
    ValidationFailed { errors: Vec<String> },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Every task in a batch failed.
    #[error("Failed to convert any files. Failed files: {}", list_failures(failed))]
    BatchFailed { failed: Vec<PathBuf> },

    /// Unexpected failure inside a conversion.
    #[error("Conversion error: {reason}")]
    Internal { reason: String },

    /// Filesystem service error.
    #[error(transparent)]
    FileSystem(#[from] FsError),

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new validation failed error.
    pub fn validation_failed(errors: Vec<String>) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Creates a new internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Whether this error means the external tool cannot be used at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::PandocNotFound { .. } | Self::IntegrationUnavailable { .. }
        )
    }

    /// Human readable summary accompanying the error, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::BatchFailed { failed } => Some(format!(
                "All {} conversion tasks failed. See logs for details.",
                failed.len()
            )),
            _ => None,
        }
    }
}

fn list_failures(failed: &[PathBuf]) -> String {
    let mut listed = failed
        .iter()
        .take(LISTED_FAILURES)
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if failed.len() > LISTED_FAILURES {
        listed.push_str(&format!(" and {} more", failed.len() - LISTED_FAILURES));
    }
    listed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_conversion_message() {
        let err = ConverterError::UnsupportedConversion {
            from: DocumentFormat::Markdown,
            to: DocumentFormat::Pdf,
        };
        assert_eq!(err.to_string(), "Unsupported conversion: markdown to pdf");
    }

    #[test]
    fn test_batch_failed_lists_five_paths() {
        let failed: Vec<PathBuf> = (1..=7).map(|i| PathBuf::from(format!("/in/{}.html", i))).collect();
        let err = ConverterError::BatchFailed { failed };
        let text = err.to_string();
        assert!(text.starts_with("Failed to convert any files. Failed files: /in/1.html"));
        assert!(text.contains("/in/5.html"));
        assert!(!text.contains("/in/6.html"));
        assert!(text.ends_with(" and 2 more"));
        assert_eq!(
            err.message().unwrap(),
            "All 7 conversion tasks failed. See logs for details."
        );
    }

    #[test]
    fn test_batch_failed_few_paths() {
        let err = ConverterError::BatchFailed {
            failed: vec![PathBuf::from("a.md"), PathBuf::from("b.md")],
        };
        assert_eq!(
            err.to_string(),
            "Failed to convert any files. Failed files: a.md, b.md"
        );
    }

    #[test]
    fn test_validation_failed_joins_errors() {
        let err = ConverterError::validation_failed(vec!["too small".into(), "empty".into()]);
        assert_eq!(err.to_string(), "Conversion validation failed: too small; empty");
        assert!(err.message().is_none());
    }

    #[test]
    fn test_is_unavailable() {
        let err = ConverterError::PandocNotFound {
            path: PathBuf::from("pandoc"),
        };
        assert!(err.is_unavailable());
        assert!(!ConverterError::internal("x").is_unavailable());
    }
}
