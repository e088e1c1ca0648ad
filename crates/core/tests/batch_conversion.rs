//! Batch conversion integration tests.
//!
//! These tests drive the converter through the in-memory filesystem and the
//! mock backend:
//! - Aggregation of successes and failures
//! - Metrics bookkeeping across a batch
//! - Panic isolation between tasks
//! - Output path resolution

mod common;

use std::path::{Path, PathBuf};

use common::{task, TestHarness};
use quackdoc_core::{
    converter::{ConverterError, DocumentFormat},
    testing::{fixtures, MockBackend},
};

#[tokio::test]
async fn test_all_tasks_succeed() {
    let mut harness = TestHarness::new().await;
    for name in ["a", "b", "c"] {
        harness
            .fs
            .add_file(format!("/in/{name}.html"), fixtures::html_document(name, "text"))
            .await;
    }

    let tasks = vec![
        task("/in/a.html", DocumentFormat::Markdown),
        task("/in/b.html", DocumentFormat::Markdown),
        task("/in/c.html", DocumentFormat::Markdown),
    ];
    let outcome = harness.converter.convert_batch(&tasks, None).await.unwrap();

    assert_eq!(outcome.content.len(), tasks.len());
    assert_eq!(outcome.message, "Successfully converted 3 files");

    let metrics = harness.converter.metrics();
    assert_eq!(metrics.successful_conversions, 3);
    assert_eq!(metrics.failed_conversions, 0);
    assert!(metrics.errors.is_empty());
    assert_eq!(metrics.conversion_times.len(), 3);
}

#[tokio::test]
async fn test_all_tasks_fail() {
    let mut harness = TestHarness::new().await;

    let tasks = vec![
        task("/in/missing1.html", DocumentFormat::Markdown),
        task("/in/missing2.md", DocumentFormat::Docx),
    ];
    let err = harness.converter.convert_batch(&tasks, None).await.unwrap_err();

    assert!(err.to_string().contains("Failed to convert any files."));
    assert!(err.to_string().contains("/in/missing1.html, /in/missing2.md"));
    assert_eq!(
        err.message().as_deref(),
        Some("All 2 conversion tasks failed. See logs for details.")
    );

    let metrics = harness.converter.metrics();
    assert_eq!(metrics.successful_conversions, 0);
    assert_eq!(metrics.failed_conversions, 2);
    assert_eq!(metrics.total_attempts, 2);
}

#[tokio::test]
async fn test_counts_add_up_for_mixed_batches() {
    let backend = MockBackend::new().fail_on("/in/bad.html", "malformed input");
    let mut harness = TestHarness::with_backend(backend).await;
    harness
        .fs
        .add_file("/in/good.html", fixtures::html_document("Good", "ok"))
        .await;
    harness
        .fs
        .add_file("/in/bad.html", fixtures::html_document("Bad", "ok"))
        .await;
    harness
        .fs
        .add_file("/in/notes.md", fixtures::markdown_document("Notes"))
        .await;

    let tasks = vec![
        task("/in/good.html", DocumentFormat::Markdown),
        task("/in/bad.html", DocumentFormat::Markdown),
        task("/in/notes.md", DocumentFormat::Docx),
        task("/in/notes.md", DocumentFormat::Pdf),
    ];
    let outcome = harness.converter.convert_batch(&tasks, None).await.unwrap();

    assert_eq!(
        outcome.message,
        "Partially successful: converted 2 files, failed to convert 2 files"
    );
    let metrics = harness.converter.metrics();
    assert_eq!(
        metrics.successful_conversions + metrics.failed_conversions,
        tasks.len()
    );
    assert_eq!(metrics.total_attempts, tasks.len());
    assert_eq!(
        metrics.errors["/in/bad.html"],
        "Pandoc conversion failed: malformed input"
    );
    assert_eq!(
        metrics.errors["/in/notes.md"],
        "Unsupported conversion: markdown to pdf"
    );
}

#[tokio::test]
async fn test_panicking_task_is_isolated() {
    let backend = MockBackend::new().panic_on("/in/second.html");
    let mut harness = TestHarness::with_backend(backend).await;
    harness
        .fs
        .add_file("/in/first.html", fixtures::html_document("First", "1"))
        .await;
    harness
        .fs
        .add_file("/in/second.html", fixtures::html_document("Second", "2"))
        .await;

    let tasks = vec![
        task("/in/first.html", DocumentFormat::Markdown),
        task("/in/second.html", DocumentFormat::Markdown),
    ];
    let outcome = harness.converter.convert_batch(&tasks, None).await.unwrap();

    assert_eq!(outcome.content, vec![PathBuf::from("/out/first.md")]);
    let metrics = harness.converter.metrics();
    assert_eq!(metrics.successful_conversions, 1);
    assert_eq!(metrics.failed_conversions, 1);
    assert_eq!(metrics.errors.len(), 1);
    let message = &metrics.errors["/in/second.html"];
    assert!(message.starts_with("Conversion error: simulated pandoc crash"));
}

#[tokio::test]
async fn test_single_file_returns_requested_path() {
    let mut harness = TestHarness::new().await;
    harness
        .fs
        .add_file("/in/input.html", fixtures::html_document("Input", "body"))
        .await;

    let outcome = harness
        .converter
        .convert_file(
            Path::new("/in/input.html"),
            Path::new("/out/result.md"),
            &DocumentFormat::Markdown,
        )
        .await
        .unwrap();
    assert_eq!(outcome.content, PathBuf::from("/out/result.md"));
}

#[tokio::test]
async fn test_unsupported_pair_is_reported() {
    let mut harness = TestHarness::new().await;
    harness.fs.add_file("/in/input.md", "# Input").await;

    let err = harness
        .converter
        .convert_file(
            Path::new("/in/input.md"),
            Path::new("/out/input.pdf"),
            &DocumentFormat::Pdf,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConverterError::UnsupportedConversion { .. }));
    assert!(err
        .to_string()
        .contains("Unsupported conversion: markdown to pdf"));
}

#[tokio::test]
async fn test_explicit_output_paths_without_override() {
    let mut harness = TestHarness::new().await;
    harness
        .fs
        .add_file("/in/a.html", fixtures::html_document("A", "a"))
        .await;
    harness
        .fs
        .add_file("/in/b.html", fixtures::html_document("B", "b"))
        .await;

    let tasks = vec![
        task("/in/a.html", DocumentFormat::Markdown).with_output_path("/custom/first.md"),
        task("/in/b.html", DocumentFormat::Markdown),
    ];
    let outcome = harness.converter.convert_batch(&tasks, None).await.unwrap();
    assert_eq!(
        outcome.content,
        vec![PathBuf::from("/custom/first.md"), PathBuf::from("/out/b.md")]
    );

    let outcome = harness
        .converter
        .convert_batch(&tasks, Some(Path::new("/forced")))
        .await
        .unwrap();
    assert_eq!(
        outcome.content,
        vec![PathBuf::from("/forced/a.md"), PathBuf::from("/forced/b.md")]
    );
}

#[tokio::test]
async fn test_validate_markdown_outputs() {
    let harness = TestHarness::new().await;
    harness.fs.add_file("/in/source.html", "<html></html>").await;
    harness.fs.add_file("/out/full.md", "# Title\n\ncontent").await;
    harness.fs.add_file("/out/blank.md", " \n\t ").await;

    let input = Path::new("/in/source.html");
    assert!(
        harness
            .converter
            .validate_conversion(Path::new("/out/full.md"), input)
            .await
    );
    assert!(
        !harness
            .converter
            .validate_conversion(Path::new("/out/blank.md"), input)
            .await
    );
}
