use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{types::PandocConfig, ConfigError};

/// Locations searched, in order, when no config path is given
pub const DEFAULT_CONFIG_LOCATIONS: &[&str] = &[
    "./config/pandoc_config.toml",
    "./config/quack_config.toml",
    "./quack_config.toml",
    "~/.quack/pandoc_config.toml",
];

/// Prefix of environment variables overriding config keys.
/// Nested keys are separated by `__`, e.g. `QUACK_PANDOC_VALIDATION__MIN_FILE_SIZE`.
pub const ENV_PREFIX: &str = "QUACK_PANDOC_";

/// Tables that may hold the pandoc settings inside a shared config file
const SECTIONS: &[&str] = &["pandoc", "conversion"];

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<PandocConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let figment = focus_section(Figment::new().merge(Toml::file(path)));
    extract(with_env(figment))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<PandocConfig, ConfigError> {
    extract(focus_section(Figment::new().merge(Toml::string(toml_str))))
}

/// Load from an explicit path, else the first default location that exists,
/// else built-in defaults. Environment overrides apply in every case.
pub fn load_config_or_default(path: Option<&Path>) -> Result<PandocConfig, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    if let Some(found) = find_config_file() {
        info!("Using configuration file {:?}", found);
        return load_config(&found);
    }

    debug!("No configuration file found, using defaults");
    let figment = Figment::new().merge(Serialized::defaults(PandocConfig::default()));
    extract(with_env(figment))
}

/// Returns the first existing file among [`DEFAULT_CONFIG_LOCATIONS`]
pub fn find_config_file() -> Option<PathBuf> {
    DEFAULT_CONFIG_LOCATIONS
        .iter()
        .filter_map(|location| expand_home(location))
        .find(|path| path.is_file())
}

fn expand_home(location: &str) -> Option<PathBuf> {
    match location.strip_prefix("~/") {
        Some(rest) => std::env::var_os("HOME").map(|home| PathBuf::from(home).join(rest)),
        None => Some(PathBuf::from(location)),
    }
}

/// Narrow a shared config document to its `[pandoc]` or `[conversion]` table
fn focus_section(figment: Figment) -> Figment {
    for section in SECTIONS {
        if figment.find_value(section).is_ok() {
            return figment.focus(section);
        }
    }
    figment
}

fn with_env(figment: Figment) -> Figment {
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

fn extract(figment: Figment) -> Result<PandocConfig, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
