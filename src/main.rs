//! Octosecrets - migrate the secrets of a deployment automation workspace.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use octosecrets::cli::output;
use octosecrets::cli::{execute, Cli};
use octosecrets::error::{CipherError, ConfigError, Error, ExtractError, SourceError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("OCTOSECRETS_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("octosecrets=debug")
        } else {
            EnvFilter::new("octosecrets=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    if let Err(e) = execute(cli, cancel).await {
        let suggestion = match &e {
            Error::Config(ConfigError::Missing(_)) => {
                Some("pass the setting as a flag, environment variable or in octosecrets.toml")
            }
            Error::Cipher(CipherError::InvalidKeyLength(_))
            | Error::Cipher(CipherError::Encoding { .. }) => {
                Some("the master key is the base64 value from the source server's master key file")
            }
            Error::Extract(ExtractError::Decrypt { .. }) => {
                Some("check the master key belongs to this database")
            }
            Error::Source(SourceError::Connect(_)) => Some("run: octosecrets check --verbose"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
