//! Command-line interface.

pub mod check;
pub mod completions;
pub mod extract;
pub mod output;
pub mod publish;
pub mod spread;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use crate::core::cipher::MasterKey;
use crate::core::config::Config;
use crate::error::{ConfigError, Result};

/// Octosecrets - migrate the secrets of a deployment automation workspace.
#[derive(Parser)]
#[command(
    name = "octosecrets",
    about = "Extract, decrypt and republish deployment-server secrets",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "OCTOSECRETS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Check the source database is reachable
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Extract and decrypt every secret into a variable-definitions file
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Extract secrets and publish them to the destination server
    Publish {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        destination: DestinationArgs,
    },

    /// Split scoped sensitive variables into unscoped secrets and references
    Spread {
        #[command(flatten)]
        destination: DestinationArgs,
        /// Only this library variable set (id or name)
        #[arg(long)]
        set: Option<String>,
        /// Show the planned renames without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Source database connection overrides and credentials.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Database server host
    #[arg(long)]
    pub db_server: Option<String>,
    /// Database server port
    #[arg(long)]
    pub db_port: Option<u16>,
    /// Database name
    #[arg(long)]
    pub db_name: Option<String>,
    /// Database user
    #[arg(long)]
    pub db_user: Option<String>,
    /// Database password
    #[arg(long, env = "OCTOSECRETS_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
    /// Base64 master key of the source server
    #[arg(long, env = "OCTOSECRETS_MASTER_KEY", hide_env_values = true)]
    pub master_key: Option<String>,
}

impl SourceArgs {
    /// Apply flag overrides on top of the file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.db_server {
            config.database.server = server.clone();
        }
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        if let Some(name) = &self.db_name {
            config.database.name = name.clone();
        }
        if let Some(user) = &self.db_user {
            config.database.user = user.clone();
        }
    }

    pub fn password(&self) -> Result<&str> {
        self.db_password
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("database password (OCTOSECRETS_DB_PASSWORD)").into())
    }

    pub fn master_key(&self) -> Result<MasterKey> {
        let encoded = self
            .master_key
            .as_deref()
            .ok_or(ConfigError::Missing("master key (OCTOSECRETS_MASTER_KEY)"))?;
        MasterKey::parse(encoded.trim())
    }
}

/// Destination server overrides and credentials.
#[derive(Args, Debug, Clone)]
pub struct DestinationArgs {
    /// Destination server base URL
    #[arg(long)]
    pub server: Option<String>,
    /// Destination space id
    #[arg(long)]
    pub space: Option<String>,
    /// Destination API key
    #[arg(long, env = "OCTOSECRETS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl DestinationArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.destination.server = server.clone();
        }
        if let Some(space) = &self.space {
            config.destination.space = space.clone();
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("API key (OCTOSECRETS_API_KEY)").into())
    }
}

/// Execute a command.
///
/// # Errors
///
/// Returns error if the command execution fails.
pub async fn execute(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let config_path = cli.config;
    let load = || Config::load(config_path.as_deref());

    match cli.command {
        Command::Check { source } => check::execute(load()?, &source).await,
        Command::Extract { source, out } => {
            extract::execute(load()?, &source, out.as_deref(), &cancel).await
        }
        Command::Publish {
            source,
            destination,
        } => publish::execute(load()?, &source, &destination, &cancel).await,
        Command::Spread {
            destination,
            set,
            dry_run,
            yes,
        } => spread::execute(load()?, &destination, set.as_deref(), dry_run, yes, &cancel).await,
        Command::Completions { shell } => completions::execute(shell),
    }
}
