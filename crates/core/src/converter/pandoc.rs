//! Pandoc command-line backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

use super::error::ConverterError;
use super::traits::DocumentBackend;
use super::types::DocumentFormat;
use crate::config::PandocConfig;

/// Backend that shells out to the `pandoc` binary.
#[derive(Debug, Clone)]
pub struct PandocCli {
    pandoc_path: PathBuf,
    timeout_secs: u64,
}

impl PandocCli {
    /// Creates a backend using the binary and timeout from the configuration.
    pub fn new(config: &PandocConfig) -> Self {
        Self {
            pandoc_path: config.pandoc_path.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Path of the binary this backend invokes.
    pub fn pandoc_path(&self) -> &Path {
        &self.pandoc_path
    }

    /// Builds the argument list for a conversion.
    fn build_args(
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        output: Option<&Path>,
        extra: &[String],
    ) -> Vec<String> {
        let mut args = vec![
            "--from".to_string(),
            from.pandoc_name().to_string(),
            "--to".to_string(),
            to.pandoc_name().to_string(),
        ];

        if let Some(output) = output {
            args.extend(["--output".to_string(), output.to_string_lossy().to_string()]);
        }

        args.extend(extra.iter().cloned());
        args.push(input.to_string_lossy().to_string());
        args
    }

    /// Parses the version out of `pandoc --version` output.
    fn parse_version(stdout: &str) -> Option<String> {
        stdout
            .lines()
            .next()?
            .split_whitespace()
            .nth(1)
            .map(|v| v.to_string())
    }

    /// Runs pandoc, enforcing the configured timeout.
    async fn run(&self, args: &[String]) -> Result<Output, ConverterError> {
        let child = Command::new(&self.pandoc_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::PandocNotFound {
                        path: self.pandoc_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        // Dropping the child on timeout kills the process
        match timeout(Duration::from_secs(self.timeout_secs), child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ConverterError::Io(e)),
            Err(_) => Err(ConverterError::Timeout {
                timeout_secs: self.timeout_secs,
            }),
        }
    }

    /// Maps a non-zero exit into a conversion error.
    fn check_status(output: &Output) -> Result<(), ConverterError> {
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(ConverterError::conversion_failed(
            format!("pandoc exited with code: {:?}", output.status.code()),
            if stderr.is_empty() { None } else { Some(stderr) },
        ))
    }
}

#[async_trait]
impl DocumentBackend for PandocCli {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn version(&self) -> Result<String, ConverterError> {
        let output = self.run(&["--version".to_string()]).await?;
        if !output.status.success() {
            return Err(ConverterError::IntegrationUnavailable {
                reason: format!(
                    "{} --version exited with code: {:?}",
                    self.pandoc_path.display(),
                    output.status.code()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_version(&stdout).ok_or_else(|| ConverterError::IntegrationUnavailable {
            reason: "could not parse pandoc version output".to_string(),
        })
    }

    async fn convert_to_string(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        args: &[String],
    ) -> Result<String, ConverterError> {
        let args = Self::build_args(input, from, to, None, args);
        debug!("Running pandoc with args: {:?}", args);

        let output = self.run(&args).await?;
        Self::check_status(&output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn convert_to_file(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        output: &Path,
        args: &[String],
    ) -> Result<(), ConverterError> {
        let args = Self::build_args(input, from, to, Some(output), args);
        debug!("Running pandoc with args: {:?}", args);

        let result = self.run(&args).await?;
        Self::check_status(&result)
    }
}

/// Verifies the backend is usable and returns its version.
pub async fn verify_pandoc<B: DocumentBackend + ?Sized>(
    backend: &B,
) -> Result<String, ConverterError> {
    match backend.version().await {
        Ok(version) => {
            info!("Found {} version: {}", backend.name(), version);
            Ok(version)
        }
        Err(e) => {
            error!("{} verification failed: {}", backend.name(), e);
            Err(e)
        }
    }
}

/// Whether the backend's binary is installed and answers.
pub async fn is_pandoc_available<B: DocumentBackend + ?Sized>(backend: &B) -> bool {
    backend.version().await.is_ok()
}

/// Builds pandoc arguments from configuration for a conversion.
pub fn prepare_pandoc_args(
    config: &PandocConfig,
    from: &DocumentFormat,
    to: &DocumentFormat,
    extra_args: &[String],
) -> Vec<String> {
    let options = &config.pandoc_options;

    let mut args = vec![format!("--wrap={}", options.wrap)];
    if options.standalone {
        args.push("--standalone".to_string());
    }
    args.push(format!("--markdown-headings={}", options.markdown_headings));
    if options.reference_links {
        args.push("--reference-links".to_string());
    }

    for path in &options.resource_path {
        args.push(format!("--resource-path={}", path.display()));
    }

    match (from, to) {
        (DocumentFormat::Html, DocumentFormat::Markdown) => {
            args.extend(config.html_to_md_extra_args.iter().cloned())
        }
        (DocumentFormat::Markdown, DocumentFormat::Docx) => {
            args.extend(config.md_to_docx_extra_args.iter().cloned())
        }
        _ => {}
    }

    args.extend(extra_args.iter().cloned());
    args
}
