//! Types for the converter module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::config::MetricsConfig;
use crate::fs::format_size;

/// Document format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Html,
    Markdown,
    Docx,
    Pdf,
    /// Plain text
    Plain,
    /// Any other format, by name
    Other(String),
}

impl DocumentFormat {
    /// Maps a file extension (without the dot) to a format.
    pub fn from_extension(extension: &str) -> Self {
        let lower = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match lower.as_str() {
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "docx" | "doc" => Self::Docx,
            "pdf" => Self::Pdf,
            "txt" | "plain" => Self::Plain,
            _ => Self::Other(lower),
        }
    }

    /// Returns the file extension used for converted output.
    pub fn extension(&self) -> &str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Plain => "txt",
            Self::Other(name) => name,
        }
    }

    /// Returns the name pandoc uses for this format.
    pub fn pandoc_name(&self) -> &str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Plain => "plain",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pandoc_name())
    }
}

impl FromStr for DocumentFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_extension(s))
    }
}

/// Information about a file for conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path to the file.
    pub path: PathBuf,
    /// Detected or hinted format.
    pub format: DocumentFormat,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

/// A single requested conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTask {
    /// Source file info.
    pub source: FileInfo,
    /// Target format.
    pub target_format: DocumentFormat,
    /// Explicit output path; derived from the batch output directory if absent.
    pub output_path: Option<PathBuf>,
}

impl ConversionTask {
    pub fn new(source: FileInfo, target_format: DocumentFormat) -> Self {
        Self {
            source,
            target_format,
            output_path: None,
        }
    }

    /// Sets an explicit output path.
    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }
}

/// Start and end of one file's conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTiming {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ConversionTiming {
    /// Elapsed time in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}

/// Size change of one file's conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSizeChange {
    pub original: u64,
    pub converted: u64,
    /// `converted / original`, 0 when the original was empty.
    pub ratio: f64,
}

/// Metrics for a converter's most recent batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionMetrics {
    pub start_time: DateTime<Utc>,
    pub total_attempts: usize,
    pub successful_conversions: usize,
    pub failed_conversions: usize,
    /// Source path to error message.
    pub errors: BTreeMap<String, String>,
    /// File name to conversion timing.
    pub conversion_times: BTreeMap<String, ConversionTiming>,
    /// File name to size change.
    pub file_sizes: BTreeMap<String, FileSizeChange>,
}

impl Default for ConversionMetrics {
    fn default() -> Self {
        Self::starting_now(0)
    }
}

impl ConversionMetrics {
    /// Fresh metrics for a run of `total_attempts` tasks.
    pub fn starting_now(total_attempts: usize) -> Self {
        Self {
            start_time: Utc::now(),
            total_attempts,
            successful_conversions: 0,
            failed_conversions: 0,
            errors: BTreeMap::new(),
            conversion_times: BTreeMap::new(),
            file_sizes: BTreeMap::new(),
        }
    }

    /// Records a failure for a source path.
    pub fn record_error(&mut self, source: &std::path::Path, message: impl Into<String>) {
        self.errors
            .insert(source.display().to_string(), message.into());
    }

    /// Records a failed conversion of `source`.
    pub fn record_failure(&mut self, source: &std::path::Path, message: impl Into<String>) {
        self.failed_conversions += 1;
        self.record_error(source, message);
    }

    /// Records a successful conversion, tracking timing and sizes as configured.
    pub fn record_success(
        &mut self,
        file_name: &str,
        timing: ConversionTiming,
        original_size: u64,
        converted_size: u64,
        config: &MetricsConfig,
    ) {
        self.successful_conversions += 1;

        if config.track_conversion_time {
            info!(
                "Conversion time for {}: {:.2} seconds",
                file_name,
                timing.duration_ms() as f64 / 1000.0
            );
            self.conversion_times.insert(file_name.to_string(), timing);
        }

        if config.track_file_sizes {
            let ratio = if original_size > 0 {
                converted_size as f64 / original_size as f64
            } else {
                0.0
            };
            info!(
                "File size change for {}: {} -> {}",
                file_name,
                format_size(original_size),
                format_size(converted_size)
            );
            self.file_sizes.insert(
                file_name.to_string(),
                FileSizeChange {
                    original: original_size,
                    converted: converted_size,
                    ratio,
                },
            );
        }
    }
}

/// Detailed information about a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionDetails {
    pub output_path: PathBuf,
    pub source_format: DocumentFormat,
    pub target_format: DocumentFormat,
    pub conversion_time_ms: u64,
    pub input_size: u64,
    pub output_size: u64,
}

/// Successful result of a conversion operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome<T> {
    /// What the operation produced.
    pub content: T,
    /// Human readable summary.
    pub message: String,
}

impl<T> ConversionOutcome<T> {
    pub fn new(content: T, message: impl Into<String>) -> Self {
        Self {
            content,
            message: message.into(),
        }
    }
}

/// Result of a conversion operation.
pub type ConversionResult<T> = Result<ConversionOutcome<T>, super::ConverterError>;

/// Errors and warnings found by a structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl StructureReport {
    /// Whether no errors were found. Warnings do not fail a document.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}
