//! Pandoc integration service.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::PandocConfig;
use crate::converter::{
    probe_file, ConversionMetrics, ConversionResult, ConversionTask, ConverterError,
    DocumentBackend, DocumentConverter, DocumentFormat, PandocCli,
};
use crate::fs::{FileSystem, LocalFs};

/// High-level entry point over a verified [`DocumentConverter`].
///
/// Defaults output paths to the service's output directory and converts
/// whole directories.
pub struct PandocIntegration<B, F> {
    converter: DocumentConverter<B, F>,
    output_dir: PathBuf,
}

impl PandocIntegration<PandocCli, LocalFs> {
    /// Initializes the service with the pandoc binary and the local disk.
    pub async fn from_config(
        config: PandocConfig,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, ConverterError> {
        let backend = PandocCli::new(&config);
        Self::initialize(config, output_dir, backend, LocalFs::new()).await
    }
}

impl<B, F> PandocIntegration<B, F>
where
    B: DocumentBackend,
    F: FileSystem,
{
    /// Verifies pandoc, builds the converter and creates the output directory.
    ///
    /// `output_dir` overrides the configured output directory.
    pub async fn initialize(
        mut config: PandocConfig,
        output_dir: Option<PathBuf>,
        backend: B,
        fs: F,
    ) -> Result<Self, ConverterError> {
        if let Some(output_dir) = output_dir {
            config.output_dir = output_dir;
        }
        let output_dir = config.output_dir.clone();

        let converter = DocumentConverter::new(config, backend, fs).await?;
        converter
            .fs()
            .create_directory(&output_dir, true)
            .await
            .map_err(|e| ConverterError::OutputDirectoryFailed {
                path: output_dir.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "Pandoc integration initialized with pandoc {}, output directory {}",
            converter.pandoc_version(),
            output_dir.display()
        );

        Ok(Self {
            converter,
            output_dir,
        })
    }

    /// Converts an HTML file to Markdown.
    ///
    /// Without `output`, writes `{output_dir}/{stem}.md`.
    pub async fn html_to_markdown(
        &mut self,
        html_path: &Path,
        output: Option<&Path>,
    ) -> ConversionResult<PathBuf> {
        let output = self.output_path(html_path, output, &DocumentFormat::Markdown);
        self.converter
            .convert_file(html_path, &output, &DocumentFormat::Markdown)
            .await
    }

    /// Converts a Markdown file to DOCX.
    ///
    /// Without `output`, writes `{output_dir}/{stem}.docx`.
    pub async fn markdown_to_docx(
        &mut self,
        markdown_path: &Path,
        output: Option<&Path>,
    ) -> ConversionResult<PathBuf> {
        let output = self.output_path(markdown_path, output, &DocumentFormat::Docx);
        self.converter
            .convert_file(markdown_path, &output, &DocumentFormat::Docx)
            .await
    }

    /// Converts every matching file in a directory to `target`.
    ///
    /// Markdown targets read `*.html` files and DOCX targets read `*.md`
    /// files unless `pattern` says otherwise.
    pub async fn convert_directory(
        &mut self,
        input_dir: &Path,
        target: &DocumentFormat,
        output_dir: Option<&Path>,
        pattern: Option<&str>,
        recursive: bool,
    ) -> ConversionResult<Vec<PathBuf>> {
        let stat = self.converter.fs().get_file_info(input_dir).await?;
        if !stat.exists || !stat.is_dir {
            return Err(ConverterError::NotADirectory {
                path: input_dir.to_path_buf(),
            });
        }

        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output_dir.clone());

        let (source_format, default_pattern) = match target {
            DocumentFormat::Markdown => (DocumentFormat::Html, "*.html"),
            DocumentFormat::Docx => (DocumentFormat::Markdown, "*.md"),
            other => {
                return Err(ConverterError::UnsupportedFormat {
                    format: other.clone(),
                })
            }
        };
        let pattern = pattern.unwrap_or(default_pattern);

        let files = self
            .converter
            .fs()
            .find_files(input_dir, pattern, recursive)
            .await?;
        if files.is_empty() {
            return Err(ConverterError::NoMatchingFiles {
                dir: input_dir.to_path_buf(),
            });
        }

        let mut tasks = Vec::with_capacity(files.len());
        for path in files {
            match probe_file(self.converter.fs(), &path, Some(&source_format)).await {
                Ok(info) => tasks.push(ConversionTask::new(info, target.clone())),
                Err(e) => warn!("Skipping file {}: {}", path.display(), e),
            }
        }
        if tasks.is_empty() {
            return Err(ConverterError::NoMatchingFiles {
                dir: input_dir.to_path_buf(),
            });
        }

        info!(
            "Converting {} files from {} to {}",
            tasks.len(),
            input_dir.display(),
            target
        );
        self.converter.convert_batch(&tasks, Some(&output_dir)).await
    }

    /// Checks a converted file against its source.
    pub async fn validate(&self, output: &Path, input: &Path) -> bool {
        self.converter.validate_conversion(output, input).await
    }

    pub fn pandoc_version(&self) -> &str {
        self.converter.pandoc_version()
    }

    pub fn metrics(&self) -> &ConversionMetrics {
        self.converter.metrics()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_path(&self, input: &Path, output: Option<&Path>, target: &DocumentFormat) -> PathBuf {
        match output {
            Some(output) => output.to_path_buf(),
            None => {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "output".to_string());
                self.output_dir
                    .join(format!("{}.{}", stem, target.extension()))
            }
        }
    }
}
