//! Configuration file management.
//!
//! Handles reading and validating `octosecrets.toml`. The file only holds
//! non-secret settings; the database password, master key and API key are
//! supplied per run through flags or environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::cipher::PaddingMode;
use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source database connection
    pub database: DatabaseConfig,
    /// Destination server
    pub destination: DestinationConfig,
    /// Reserved names and decryption behaviour
    pub secrets: SecretsConfig,
}

/// Source database connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    /// Accept the server certificate without validation
    pub trust_cert: bool,
    pub connect_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: constants::DEFAULT_DB_PORT,
            name: constants::DEFAULT_DB_NAME.to_string(),
            user: String::new(),
            trust_cert: true,
            connect_timeout_secs: constants::CONNECT_TIMEOUT_SECS,
            query_timeout_secs: constants::QUERY_TIMEOUT_SECS,
        }
    }
}

/// Destination server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Base URL, e.g. `https://octopus.example.com`
    pub server: String,
    pub space: String,
    pub request_timeout_secs: u64,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            space: constants::DEFAULT_SPACE.to_string(),
            request_timeout_secs: constants::REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Names reserved for this tool's own output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedNames {
    /// Library variable set holding the payload
    pub container: String,
    /// Variable holding the payload
    pub variable: String,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self {
            container: constants::SECRETS_CONTAINER.to_string(),
            variable: constants::SECRETS_VARIABLE.to_string(),
        }
    }
}

/// `[secrets]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    #[serde(flatten)]
    pub reserved: ReservedNames,
    pub padding: PaddingMode,
}

impl Config {
    /// Default configuration file path in the current directory
    pub fn default_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// file is read if present and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for a missing explicit path,
    /// `ConfigError::Parse` for malformed TOML, or a validation error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if required {
                return Err(ConfigError::NotFound(path.display().to_string()).into());
            }
            debug!("no config file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let config = Self::parse(&contents)?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings that would otherwise fail late.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` on the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.database.port == 0 {
            return Err(invalid("database.port", "must be non-zero"));
        }
        if self.database.connect_timeout_secs == 0 {
            return Err(invalid("database.connect_timeout_secs", "must be non-zero"));
        }
        if self.database.query_timeout_secs == 0 {
            return Err(invalid("database.query_timeout_secs", "must be non-zero"));
        }
        if self.destination.request_timeout_secs == 0 {
            return Err(invalid("destination.request_timeout_secs", "must be non-zero"));
        }
        if self.secrets.reserved.container.trim().is_empty() {
            return Err(invalid("secrets.container", "must not be empty"));
        }
        if self.secrets.reserved.variable.trim().is_empty() {
            return Err(invalid("secrets.variable", "must not be empty"));
        }
        Ok(())
    }

    /// Check the settings needed to reach the source database are present.
    pub fn require_database(&self) -> Result<()> {
        if self.database.server.trim().is_empty() {
            return Err(ConfigError::Missing("database.server").into());
        }
        if self.database.user.trim().is_empty() {
            return Err(ConfigError::Missing("database.user").into());
        }
        Ok(())
    }

    /// Check the settings needed to reach the destination server are present.
    pub fn require_destination(&self) -> Result<()> {
        if self.destination.server.trim().is_empty() {
            return Err(ConfigError::Missing("destination.server").into());
        }
        if self.destination.space.trim().is_empty() {
            return Err(ConfigError::Missing("destination.space").into());
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
    .into()
}
