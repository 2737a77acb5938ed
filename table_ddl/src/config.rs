//! Configuration handling for table_ddl

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Schema inspected when none is configured
pub const DEFAULT_SCHEMA: &str = "public";

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)?;

    config.validate()?;
    Ok(config)
}

/// Represents the complete table_ddl configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub output: Option<OutputConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Build a configuration from a bare connection URL
    pub fn from_url(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.to_string(),
                pool_size: None,
                timeout_seconds: None,
                schema: None,
            },
            output: None,
            logging: None,
        }
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(Error::ConfigError("database.url must not be empty".to_string()));
        }
        if self.database.pool_size == Some(0) {
            return Err(Error::ConfigError(
                "database.pool_size must be greater than zero".to_string(),
            ));
        }
        if let Some(schema) = &self.database.schema {
            if schema.trim().is_empty() {
                return Err(Error::ConfigError(
                    "database.schema must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub schema: Option<String>,
}

impl DatabaseConfig {
    /// Schema to inspect, falling back to `public`
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }
}

/// Where dumped DDL files go
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: String,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}
