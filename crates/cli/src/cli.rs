use clap::{Parser, Subcommand};
use std::path::PathBuf;

use quackdoc_core::DocumentFormat;

/// Convert documents between HTML, Markdown and DOCX with pandoc
#[derive(Parser, Debug)]
#[command(name = "quackdoc", version, about)]
pub struct Cli {
    /// Configuration file. Defaults to the first file found in the standard locations
    #[arg(short, long, global = true, env = "QUACKDOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for converted files, overriding the configuration
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `quackdoc_core=trace`. Overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an HTML file to Markdown
    HtmlToMd {
        input: PathBuf,

        /// Output file. Defaults to `<output-dir>/<name>.md`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a Markdown file to DOCX
    MdToDocx {
        input: PathBuf,

        /// Output file. Defaults to `<output-dir>/<name>.docx`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert every matching file in a directory
    ConvertDir {
        dir: PathBuf,

        /// Target format: `markdown` (from HTML) or `docx` (from Markdown)
        #[arg(long, value_parser = parse_format)]
        to: DocumentFormat,

        /// File name pattern, e.g. `*.htm`
        #[arg(long)]
        pattern: Option<String>,

        /// Search subdirectories too
        #[arg(short, long, default_value_t = false)]
        recursive: bool,
    },

    /// Check a converted file against its source. Exits non-zero when invalid.
    ///
    /// The pandoc binary must still be available, since every command starts
    /// by verifying it.
    Validate { output: PathBuf, input: PathBuf },

    /// Print the quackdoc and pandoc versions
    Version,
}

fn parse_format(value: &str) -> Result<DocumentFormat, String> {
    if value.trim().is_empty() {
        return Err("format must not be empty".to_string());
    }
    Ok(DocumentFormat::from_extension(value))
}
