pub mod config;
pub mod converter;
pub mod fs;
pub mod service;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, ConfigError,
    PandocConfig,
};
pub use converter::{
    ConversionMetrics, ConversionOutcome, ConversionResult, ConversionTask, ConverterError,
    DocumentBackend, DocumentConverter, DocumentFormat, FileInfo, PandocCli,
};
pub use fs::{FileSystem, FsError, LocalFs};
pub use service::PandocIntegration;
