//! Single-file and batch document conversion.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::error::ConverterError;
use super::html_to_md::convert_html_to_markdown;
use super::md_to_docx::convert_markdown_to_docx;
use super::pandoc::verify_pandoc;
use super::probe::probe_file;
use super::structure::validate_docx_structure;
use super::traits::DocumentBackend;
use super::types::{
    ConversionMetrics, ConversionOutcome, ConversionResult, ConversionTask, DocumentFormat,
};
use super::ensure_parent_dir;
use crate::config::PandocConfig;
use crate::fs::{format_size, FileSystem};

/// Converts documents with a [`DocumentBackend`], reading and writing
/// through a [`FileSystem`].
///
/// A converter only exists once its backend has been verified. Conversions
/// take `&mut self` because they update the converter's metrics, so a single
/// converter runs one batch at a time.
pub struct DocumentConverter<B, F> {
    config: PandocConfig,
    backend: B,
    fs: F,
    version: String,
    metrics: ConversionMetrics,
}

impl<B, F> DocumentConverter<B, F>
where
    B: DocumentBackend,
    F: FileSystem,
{
    /// Verifies the backend and creates a converter.
    ///
    /// Fails with [`ConverterError::PandocNotFound`] when the backend's
    /// binary is missing.
    pub async fn new(config: PandocConfig, backend: B, fs: F) -> Result<Self, ConverterError> {
        let version = verify_pandoc(&backend).await?;
        Ok(Self {
            config,
            backend,
            fs,
            version,
            metrics: ConversionMetrics::default(),
        })
    }

    /// Version reported by the backend at construction.
    pub fn pandoc_version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &PandocConfig {
        &self.config
    }

    /// Metrics of the most recent batch, plus any single conversions since.
    pub fn metrics(&self) -> &ConversionMetrics {
        &self.metrics
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Converts one file to `target`, writing it to `output`.
    ///
    /// Supported pairs are HTML to Markdown and Markdown to DOCX.
    pub async fn convert_file(
        &mut self,
        input: &Path,
        output: &Path,
        target: &DocumentFormat,
    ) -> ConversionResult<PathBuf> {
        let info = probe_file(&self.fs, input, None).await?;
        ensure_parent_dir(&self.fs, output).await?;

        match (&info.format, target) {
            (DocumentFormat::Html, DocumentFormat::Markdown) => {
                let details = convert_html_to_markdown(
                    &self.backend,
                    &self.fs,
                    input,
                    output,
                    &self.config,
                    &mut self.metrics,
                )
                .await?;
                Ok(ConversionOutcome::new(
                    details.output_path,
                    format!("Successfully converted {} to Markdown", input.display()),
                ))
            }
            (DocumentFormat::Markdown, DocumentFormat::Docx) => {
                let details = convert_markdown_to_docx(
                    &self.backend,
                    &self.fs,
                    input,
                    output,
                    &self.config,
                    &mut self.metrics,
                )
                .await?;
                Ok(ConversionOutcome::new(
                    details.output_path,
                    format!("Successfully converted {} to DOCX", input.display()),
                ))
            }
            (from, to) => Err(ConverterError::UnsupportedConversion {
                from: from.clone(),
                to: to.clone(),
            }),
        }
    }

    /// Converts every task in order, never stopping at a failed task.
    ///
    /// With `output_dir` set, every output lands in that directory regardless
    /// of the tasks' explicit paths. Without it, tasks without an explicit
    /// path land in the configured output directory. Metrics are reset at
    /// the start of each batch.
    pub async fn convert_batch(
        &mut self,
        tasks: &[ConversionTask],
        output_dir: Option<&Path>,
    ) -> ConversionResult<Vec<PathBuf>> {
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output_dir.clone());
        self.fs
            .create_directory(&dir, true)
            .await
            .map_err(|e| ConverterError::OutputDirectoryFailed {
                path: dir.clone(),
                reason: e.to_string(),
            })?;

        self.metrics = ConversionMetrics::starting_now(tasks.len());

        let mut converted = Vec::new();
        let mut failed = Vec::new();

        for task in tasks {
            let source = &task.source.path;
            let output = resolve_output_path(task, &dir, output_dir.is_some());

            let result = AssertUnwindSafe(self.convert_file(source, &output, &task.target_format))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ConverterError::internal(panic_message(&*panic))));

            match result {
                Ok(outcome) => {
                    debug!("{}", outcome.message);
                    converted.push(outcome.content);
                }
                Err(e) => {
                    error!("Failed to convert {}: {}", source.display(), e);
                    self.metrics.record_error(source, e.to_string());
                    failed.push(source.clone());
                }
            }
        }

        self.metrics.successful_conversions = converted.len();
        self.metrics.failed_conversions = failed.len();

        if failed.is_empty() {
            let message = format!("Successfully converted {} files", converted.len());
            info!("{}", message);
            Ok(ConversionOutcome::new(converted, message))
        } else if converted.is_empty() {
            Err(ConverterError::BatchFailed { failed })
        } else {
            let message = format!(
                "Partially successful: converted {} files, failed to convert {} files",
                converted.len(),
                failed.len()
            );
            warn!("{}", message);
            Ok(ConversionOutcome::new(converted, message))
        }
    }

    /// Sanity-checks a converted file against its source.
    ///
    /// Markdown must have non-blank content, DOCX must pass the structural
    /// check, anything else must exceed the minimum size. Returns `false`
    /// on any error.
    pub async fn validate_conversion(&self, output: &Path, input: &Path) -> bool {
        match self.check_conversion(output, input).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("Error validating {}: {}", output.display(), e);
                false
            }
        }
    }

    async fn check_conversion(&self, output: &Path, input: &Path) -> Result<bool, ConverterError> {
        let output_stat = self.fs.get_file_info(output).await?;
        if !output_stat.exists {
            error!("Output file does not exist: {}", output.display());
            return Ok(false);
        }

        let input_stat = self.fs.get_file_info(input).await?;
        if !input_stat.exists {
            error!("Input file does not exist: {}", input.display());
            return Ok(false);
        }

        debug!(
            "Validating conversion of {} ({}) to {} ({})",
            input.display(),
            format_size(input_stat.size),
            output.display(),
            format_size(output_stat.size)
        );

        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let valid = match extension.as_str() {
            "md" | "markdown" => !self.fs.read_text(output).await?.trim().is_empty(),
            "docx" => {
                let bytes = self.fs.read_bytes(output).await?;
                validate_docx_structure(&bytes, self.config.validation.check_links).is_valid()
            }
            _ => output_stat.size > self.config.validation.min_file_size,
        };
        Ok(valid)
    }
}

/// Picks where a batch task writes its output.
fn resolve_output_path(task: &ConversionTask, dir: &Path, dir_overridden: bool) -> PathBuf {
    match &task.output_path {
        Some(path) if !dir_overridden => path.clone(),
        _ => {
            let stem = task
                .source
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            dir.join(format!("{}.{}", stem, task.target_format.extension()))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
