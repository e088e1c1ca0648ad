mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quackdoc_core::{
    config::LoggingConfig,
    converter::{is_pandoc_available, verify_pandoc},
    load_config_or_default, validate_config, ConversionMetrics, ConverterError, LocalFs,
    PandocCli, PandocConfig, PandocIntegration,
};

use cli::{Cli, Command};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Logging settings live in the config file, so load it before anything logs
    let config = load_config_or_default(cli.config.as_deref());
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(&cli, &logging);

    let config = config.context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("quackdoc {} using pandoc at {:?}", VERSION, config.pandoc_path);

    match cli.command {
        Command::Version => print_versions(&config).await,
        Command::HtmlToMd { input, output } => {
            let mut service = initialize(config, cli.output_dir).await?;
            let result = service.html_to_markdown(&input, output.as_deref()).await;
            log_metrics(service.metrics());
            let outcome = result.map_err(report).context("HTML to Markdown conversion failed")?;
            println!("{}", outcome.message);
            Ok(())
        }
        Command::MdToDocx { input, output } => {
            let mut service = initialize(config, cli.output_dir).await?;
            let result = service.markdown_to_docx(&input, output.as_deref()).await;
            log_metrics(service.metrics());
            let outcome = result.map_err(report).context("Markdown to DOCX conversion failed")?;
            println!("{}", outcome.message);
            Ok(())
        }
        Command::ConvertDir {
            dir,
            to,
            pattern,
            recursive,
        } => {
            let mut service = initialize(config, cli.output_dir).await?;
            let result = service
                .convert_directory(&dir, &to, None, pattern.as_deref(), recursive)
                .await;
            log_metrics(service.metrics());
            let outcome = result
                .map_err(report)
                .with_context(|| format!("Failed to convert directory {:?}", dir))?;
            println!("{}", outcome.message);
            for path in &outcome.content {
                println!("  {}", path.display());
            }
            Ok(())
        }
        Command::Validate { output, input } => {
            let service = initialize(config, cli.output_dir).await?;
            if !service.validate(&output, &input).await {
                bail!("Validation failed for {:?}", output);
            }
            println!("{} is valid", output.display());
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs || logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn initialize(
    config: PandocConfig,
    output_dir: Option<std::path::PathBuf>,
) -> Result<PandocIntegration<PandocCli, LocalFs>> {
    PandocIntegration::from_config(config, output_dir)
        .await
        .context("Failed to initialize pandoc integration")
}

async fn print_versions(config: &PandocConfig) -> Result<()> {
    println!("quackdoc {}", VERSION);

    let backend = PandocCli::new(config);
    if !is_pandoc_available(&backend).await {
        bail!("pandoc not available at {:?}", backend.pandoc_path());
    }
    let version = verify_pandoc(&backend).await?;
    println!("pandoc {}", version);
    Ok(())
}

/// Logs the summary attached to an error before handing it to anyhow.
fn report(e: ConverterError) -> anyhow::Error {
    if let Some(message) = e.message() {
        error!("{}", message);
    }
    e.into()
}

fn log_metrics(metrics: &ConversionMetrics) {
    info!(
        "Conversions: {} attempted, {} succeeded, {} failed",
        metrics.total_attempts, metrics.successful_conversions, metrics.failed_conversions
    );
    for (path, message) in &metrics.errors {
        error!("{}: {}", path, message);
    }
    let json = serde_json::to_string(metrics).unwrap_or_default();
    tracing::debug!("Metrics: {}", json);
}
