//! HTML to Markdown conversion.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::Path;
use tracing::{debug, error, warn};

use super::error::ConverterError;
use super::pandoc::prepare_pandoc_args;
use super::structure::{check_conversion_ratio, check_file_size, validate_html_structure};
use super::traits::DocumentBackend;
use super::types::{ConversionDetails, ConversionMetrics, ConversionTiming, DocumentFormat};
use super::{ensure_parent_dir, file_name_of};
use crate::config::PandocConfig;
use crate::fs::FileSystem;

static ATTRIBUTE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static FENCED_DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r":::+\s*[^\n]*\n").unwrap());
static DIV_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<div[^>]*>|</div>").unwrap());
static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!--[^>]*-->").unwrap());
static BLANK_BEFORE_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n-").unwrap());

/// Converts an HTML file to Markdown, recording the outcome in `metrics`.
pub async fn convert_html_to_markdown<B, F>(
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
            error!("Failed to convert {} to Markdown: {}", input.display(), e);
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
    let original_size = validate_input(fs, input, config).await?;

    let start = Utc::now();
    let args = prepare_pandoc_args(config, &DocumentFormat::Html, &DocumentFormat::Markdown, &[]);
    debug!("Converting {} to Markdown with args: {:?}", input.display(), args);

    let raw = backend
        .convert_to_string(input, &DocumentFormat::Html, &DocumentFormat::Markdown, &args)
        .await?;
    let markdown = post_process_markdown(&raw);

    ensure_parent_dir(fs, output).await?;
    let written = fs.write_text(output, &markdown).await?;
    let end = Utc::now();

    let errors = validate_output(fs, output, original_size, config).await;
    if !errors.is_empty() {
        return Err(ConverterError::validation_failed(errors));
    }

    let output_size = if written > 0 {
        written
    } else {
        fs.get_file_info(output).await?.size
    };

    let timing = ConversionTiming { start, end };
    let details = ConversionDetails {
        output_path: output.to_path_buf(),
        source_format: DocumentFormat::Html,
        target_format: DocumentFormat::Markdown,
        conversion_time_ms: timing.duration_ms().max(0) as u64,
        input_size: original_size,
        output_size,
    };
    Ok((details, timing))
}

/// Checks the input exists and, when enabled, has a sane HTML structure.
/// Returns the input size.
async fn validate_input<F: FileSystem + ?Sized>(
    fs: &F,
    input: &Path,
    config: &PandocConfig,
) -> Result<u64, ConverterError> {
    let stat = fs.get_file_info(input).await?;
    if !stat.exists || !stat.is_file {
        return Err(ConverterError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    if !config.validation.verify_structure {
        return Ok(stat.size);
    }

    let content = fs.read_text(input).await?;
    let report = validate_html_structure(&content, config.validation.check_links);
    for warning in &report.warnings {
        debug!("{}: {}", input.display(), warning);
    }
    if !report.is_valid() {
        return Err(ConverterError::InvalidStructure {
            path: input.to_path_buf(),
            reason: report.errors.join("; "),
        });
    }

    Ok(stat.size)
}

/// Validates written Markdown. An empty list means the output is acceptable.
async fn validate_output<F: FileSystem + ?Sized>(
    fs: &F,
    output: &Path,
    original_size: u64,
    config: &PandocConfig,
) -> Vec<String> {
    let mut errors = Vec::new();

    let stat = match fs.get_file_info(output).await {
        Ok(stat) if stat.exists => stat,
        _ => {
            errors.push(format!("Output file does not exist: {}", output.display()));
            return errors;
        }
    };

    if let Err(e) = check_file_size(stat.size, config.validation.min_file_size) {
        errors.push(e);
    }
    if let Err(e) = check_conversion_ratio(
        stat.size,
        original_size,
        config.validation.conversion_ratio_threshold,
    ) {
        errors.push(e);
    }

    let content = match fs.read_text(output).await {
        Ok(content) => content,
        Err(e) => {
            errors.push(format!("Error reading output file: {}", e));
            return errors;
        }
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        errors.push("Output file is empty".to_string());
    } else if trimmed.len() < 10 && !content.contains("# ") {
        errors.push("Output file contains minimal content".to_string());
    } else if !content.contains("# ") && trimmed.len() > 100 {
        warn!("No headers found in converted markdown: {}", output.display());
        if config.validation.verify_structure {
            errors.push("No headers found in converted markdown".to_string());
        }
    }

    errors
}

/// Cleans pandoc's Markdown output.
///
/// Drops attribute blocks, fenced divs, raw `<div>` tags and HTML comments,
/// and squeezes runs of blank lines.
pub fn post_process_markdown(markdown: &str) -> String {
    let cleaned = ATTRIBUTE_BLOCK.replace_all(markdown, "");
    let cleaned = FENCED_DIV.replace_all(&cleaned, "");
    let cleaned = DIV_TAG.replace_all(&cleaned, "");
    let cleaned = EXTRA_BLANK_LINES.replace_all(&cleaned, "\n\n");
    let cleaned = HTML_COMMENT.replace_all(&cleaned, "");
    let cleaned = BLANK_BEFORE_LIST.replace_all(&cleaned, "\n-");
    cleaned.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MemoryFs, MockBackend};

    fn lenient_config() -> PandocConfig {
        let mut config = PandocConfig::default();
        config.validation.min_file_size = 0;
        config.validation.conversion_ratio_threshold = 0.0;
        config
    }

    #[test]
    fn test_post_process_strips_pandoc_noise() {
        assert_eq!(post_process_markdown("# Title {#title .cls}\n"), "# Title \n");
        assert_eq!(post_process_markdown("::: note\nBody\n"), "Body\n");
        assert_eq!(post_process_markdown("<div class=\"x\">kept</div>"), "kept");
        assert_eq!(post_process_markdown("a<!-- gone -->b"), "ab");
    }

    #[test]
    fn test_post_process_squeezes_blank_lines() {
        assert_eq!(post_process_markdown("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(post_process_markdown("Text\n\n- item"), "Text\n- item");
    }

    #[test]
    fn test_post_process_plain_text_untouched() {
        assert_eq!(post_process_markdown("# A\n\nbody\n"), "# A\n\nbody\n");
    }

    #[tokio::test]
    async fn test_convert_html_writes_markdown_and_tracks_metrics() {
        let fs = MemoryFs::new();
        fs.add_file("/in/page.html", fixtures::html_document("Title", "Some body text"))
            .await;
        let backend = MockBackend::new().with_markdown(fixtures::markdown_document("Title"));
        let mut metrics = ConversionMetrics::default();

        let details = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/page.html"),
            Path::new("/out/page.md"),
            &lenient_config(),
            &mut metrics,
        )
        .await
        .unwrap();

        assert_eq!(details.output_path, Path::new("/out/page.md"));
        assert_eq!(details.source_format, DocumentFormat::Html);
        assert_eq!(details.output_size, fixtures::markdown_document("Title").len() as u64);
        assert_eq!(
            fs.file_text("/out/page.md").await.unwrap(),
            fixtures::markdown_document("Title")
        );
        assert_eq!(metrics.successful_conversions, 1);
        assert!(metrics.conversion_times.contains_key("page.html"));
        assert!(metrics.file_sizes.contains_key("page.html"));
    }

    #[tokio::test]
    async fn test_convert_html_passes_configured_args() {
        let fs = MemoryFs::new();
        fs.add_file("/in/page.html", fixtures::html_document("T", "x")).await;
        let backend = MockBackend::new();
        let mut metrics = ConversionMetrics::default();

        convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/page.html"),
            Path::new("/out/page.md"),
            &lenient_config(),
            &mut metrics,
        )
        .await
        .unwrap();

        let calls = backend.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].args.contains(&"--strip-comments".to_string()));
        assert_eq!(calls[0].to, DocumentFormat::Markdown);
    }

    #[tokio::test]
    async fn test_convert_html_missing_input() {
        let fs = MemoryFs::new();
        let backend = MockBackend::new();
        let mut metrics = ConversionMetrics::default();

        let err = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/missing.html"),
            Path::new("/out/missing.md"),
            &PandocConfig::default(),
            &mut metrics,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConverterError::InputNotFound { .. }));
        assert_eq!(metrics.failed_conversions, 1);
        assert!(metrics.errors.contains_key("/in/missing.html"));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_convert_html_rejects_bodyless_input() {
        let fs = MemoryFs::new();
        fs.add_file("/in/frag.html", "<p>fragment only</p>").await;
        let backend = MockBackend::new();
        let mut metrics = ConversionMetrics::default();

        let err = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/frag.html"),
            Path::new("/out/frag.md"),
            &PandocConfig::default(),
            &mut metrics,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConverterError::InvalidStructure { .. }));
        assert!(err.to_string().contains("HTML document missing body tag"));
    }

    #[tokio::test]
    async fn test_convert_html_skips_structure_check_when_disabled() {
        let fs = MemoryFs::new();
        fs.add_file("/in/frag.html", "<p>fragment only</p>").await;
        let backend = MockBackend::new();
        let mut config = lenient_config();
        config.validation.verify_structure = false;
        let mut metrics = ConversionMetrics::default();

        let result = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/frag.html"),
            Path::new("/out/frag.md"),
            &config,
            &mut metrics,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_convert_html_output_validation_errors() {
        let fs = MemoryFs::new();
        fs.add_file("/in/page.html", fixtures::html_document("T", &"long ".repeat(100)))
            .await;
        let backend = MockBackend::new().with_markdown("   \n");
        let mut metrics = ConversionMetrics::default();

        let err = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/page.html"),
            Path::new("/out/page.md"),
            &PandocConfig::default(),
            &mut metrics,
        )
        .await
        .unwrap_err();

        match &err {
            ConverterError::ValidationFailed { errors } => {
                assert!(errors.iter().any(|e| e.contains("below the minimum threshold")));
                assert!(errors.iter().any(|e| e.contains("less than 10%")));
                assert!(errors.contains(&"Output file is empty".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(metrics.failed_conversions, 1);
        assert_eq!(metrics.successful_conversions, 0);
    }

    #[tokio::test]
    async fn test_convert_html_requires_headers_in_long_output() {
        let fs = MemoryFs::new();
        fs.add_file("/in/page.html", fixtures::html_document("T", "x")).await;
        let backend = MockBackend::new().with_markdown("plain words ".repeat(20));
        let mut metrics = ConversionMetrics::default();

        let err = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/page.html"),
            Path::new("/out/page.md"),
            &lenient_config(),
            &mut metrics,
        )
        .await
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("No headers found in converted markdown"));

        let mut config = lenient_config();
        config.validation.verify_structure = false;
        let result = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/page.html"),
            Path::new("/out/page.md"),
            &config,
            &mut metrics,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_convert_html_backend_failure() {
        let fs = MemoryFs::new();
        fs.add_file("/in/page.html", fixtures::html_document("T", "x")).await;
        let backend = MockBackend::new().fail_on("/in/page.html", "unknown reader");
        let mut metrics = ConversionMetrics::default();

        let err = convert_html_to_markdown(
            &backend,
            &fs,
            Path::new("/in/page.html"),
            Path::new("/out/page.md"),
            &lenient_config(),
            &mut metrics,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConverterError::ConversionFailed { .. }));
        assert_eq!(
            metrics.errors["/in/page.html"],
            "Pandoc conversion failed: unknown reader"
        );
        assert!(!fs.exists("/out/page.md").await);
    }
}
