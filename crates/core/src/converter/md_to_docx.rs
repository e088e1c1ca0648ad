//! Markdown to DOCX conversion.

use chrono::Utc;
use std::path::Path;
use tracing::{debug, error};

use super::error::ConverterError;
use super::pandoc::prepare_pandoc_args;
use super::structure::{check_file_size, validate_docx_structure};
use super::traits::DocumentBackend;
use super::types::{ConversionDetails, ConversionMetrics, ConversionTiming, DocumentFormat};
use super::{ensure_parent_dir, file_name_of};
use crate::config::PandocConfig;
use crate::fs::FileSystem;

/// Converts a Markdown file to DOCX, recording the outcome in `metrics`.
pub async fn convert_markdown_to_docx<B, F>(
    backend: &B,
    fs: &F,
    input: &Path,
    output: &Path,
    config: &PandocConfig,
    metrics: &mut ConversionMetrics,
) -> Result<ConversionDetails, ConverterError>
where
    B: DocumentBackend + ?Sized,
    F: FileSystem + ?Sized,
{
    match convert(backend, fs, input, output, config).await {
        Ok((details, timing)) => {
            metrics.record_success(
                &file_name_of(input),
                timing,
                details.input_size,
                details.output_size,
                &config.metrics,
            );
            Ok(details)
        }
        Err(e) => {
            error!("Failed to convert {} to DOCX: {}", input.display(), e);
            metrics.record_failure(input, e.to_string());
            Err(e)
        }
    }
}

async fn convert<B, F>(
    backend: &B,
    fs: &F,
    input: &Path,
    output: &Path,
    config: &PandocConfig,
) -> Result<(ConversionDetails, ConversionTiming), ConverterError>
where
    B: DocumentBackend + ?Sized,
    F: FileSystem + ?Sized,
{
    let stat = fs.get_file_info(input).await?;
    if !stat.exists || !stat.is_file {
        return Err(ConverterError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    let original_size = stat.size;

    if config.validation.verify_structure {
        let content = fs.read_text(input).await?;
        if content.trim().is_empty() {
            return Err(ConverterError::InvalidStructure {
                path: input.to_path_buf(),
                reason: "Markdown file is empty".to_string(),
            });
        }
    }

    ensure_parent_dir(fs, output).await?;

    let start = Utc::now();
    let args = prepare_pandoc_args(config, &DocumentFormat::Markdown, &DocumentFormat::Docx, &[]);
    debug!("Converting {} to DOCX with args: {:?}", input.display(), args);

    backend
        .convert_to_file(
            input,
            &DocumentFormat::Markdown,
            &DocumentFormat::Docx,
            output,
            &args,
        )
        .await?;
    let end = Utc::now();

    let output_size = validate_output(fs, output, config).await?;

    let timing = ConversionTiming { start, end };
    let details = ConversionDetails {
        output_path: output.to_path_buf(),
        source_format: DocumentFormat::Markdown,
        target_format: DocumentFormat::Docx,
        conversion_time_ms: timing.duration_ms().max(0) as u64,
        input_size: original_size,
        output_size,
    };
    Ok((details, timing))
}

/// Validates the written DOCX and returns its size.
async fn validate_output<F: FileSystem + ?Sized>(
    fs: &F,
    output: &Path,
    config: &PandocConfig,
) -> Result<u64, ConverterError> {
    let stat = fs.get_file_info(output).await?;
    if !stat.exists {
        return Err(ConverterError::validation_failed(vec![format!(
            "Output file does not exist: {}",
            output.display()
        )]));
    }

    let mut errors = Vec::new();
    if let Err(e) = check_file_size(stat.size, config.validation.min_file_size) {
        errors.push(e);
    }

    if config.validation.verify_structure {
        let bytes = fs.read_bytes(output).await?;
        let report = validate_docx_structure(&bytes, config.validation.check_links);
        for warning in &report.warnings {
            debug!("{}: {}", output.display(), warning);
        }
        errors.extend(report.errors);
    }

    if errors.is_empty() {
        Ok(stat.size)
    } else {
        Err(ConverterError::validation_failed(errors))
    }
}
