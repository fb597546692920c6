//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RegistrationConfig;
use crate::config::validation::{validate, ConfigError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Invalid(#[from] ConfigError),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RegistrationConfig, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RegistrationConfig, LoadError> {
    let config: RegistrationConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}
