use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration for document conversion
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PandocConfig {
    /// Path to the pandoc binary
    #[serde(default = "default_pandoc_path")]
    pub pandoc_path: PathBuf,
    /// Timeout for a single pandoc invocation in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub pandoc_options: PandocOptions,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Extra arguments for HTML to Markdown conversion
    #[serde(default = "default_html_to_md_args")]
    pub html_to_md_extra_args: Vec<String>,
    /// Extra arguments for Markdown to DOCX conversion
    #[serde(default)]
    pub md_to_docx_extra_args: Vec<String>,
    /// Default directory for converted files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PandocConfig {
    fn default() -> Self {
        Self {
            pandoc_path: default_pandoc_path(),
            timeout_secs: default_timeout(),
            pandoc_options: PandocOptions::default(),
            validation: ValidationConfig::default(),
            metrics: MetricsConfig::default(),
            html_to_md_extra_args: default_html_to_md_args(),
            md_to_docx_extra_args: Vec::new(),
            output_dir: default_output_dir(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PandocConfig {
    /// Sets the output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the pandoc binary path.
    pub fn with_pandoc_path(mut self, pandoc_path: impl Into<PathBuf>) -> Self {
        self.pandoc_path = pandoc_path.into();
        self
    }
}

fn default_pandoc_path() -> PathBuf {
    PathBuf::from("pandoc")
}

fn default_timeout() -> u64 {
    300
}

fn default_html_to_md_args() -> Vec<String> {
    vec!["--strip-comments".to_string(), "--no-highlight".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

/// Text wrapping mode passed as `--wrap`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    None,
    Auto,
    Preserve,
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Auto => "auto",
            Self::Preserve => "preserve",
        })
    }
}

/// Markdown heading style passed as `--markdown-headings`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingStyle {
    #[default]
    Atx,
    Setext,
}

impl fmt::Display for HeadingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Atx => "atx",
            Self::Setext => "setext",
        })
    }
}

/// Options forwarded to every pandoc invocation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PandocOptions {
    #[serde(default)]
    pub wrap: WrapMode,
    #[serde(default = "default_true")]
    pub standalone: bool,
    #[serde(default)]
    pub markdown_headings: HeadingStyle,
    #[serde(default)]
    pub reference_links: bool,
    /// Additional resource paths for pandoc
    #[serde(default)]
    pub resource_path: Vec<PathBuf>,
}

impl Default for PandocOptions {
    fn default() -> Self {
        Self {
            wrap: WrapMode::default(),
            standalone: true,
            markdown_headings: HeadingStyle::default(),
            reference_links: false,
            resource_path: Vec::new(),
        }
    }
}

/// Document validation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Whether to verify document structure of inputs and outputs
    #[serde(default = "default_true")]
    pub verify_structure: bool,
    /// Minimum output file size in bytes
    #[serde(default = "default_min_file_size")]
    pub min_file_size: u64,
    /// Minimum ratio of converted to original file size
    #[serde(default = "default_ratio_threshold")]
    pub conversion_ratio_threshold: f64,
    /// Whether to check links in documents
    #[serde(default)]
    pub check_links: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            verify_structure: true,
            min_file_size: default_min_file_size(),
            conversion_ratio_threshold: default_ratio_threshold(),
            check_links: false,
        }
    }
}

fn default_min_file_size() -> u64 {
    50
}

fn default_ratio_threshold() -> f64 {
    0.1
}

/// Metrics tracking settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub track_conversion_time: bool,
    #[serde(default = "default_true")]
    pub track_file_sizes: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            track_conversion_time: true,
            track_file_sizes: true,
        }
    }
}

/// Logging settings for the binary
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
