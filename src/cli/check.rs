//! Check command.
//!
//! Connects to the source database and runs a trivial query within the
//! connection timeout.

use std::time::Duration;

use tracing::info;

use crate::cli::{output, SourceArgs};
use crate::core::config::Config;
use crate::core::source::{MssqlSource, SecretSource};
use crate::error::{Result, SourceError};

/// Validate source connectivity.
pub async fn execute(mut config: Config, source: &SourceArgs) -> Result<()> {
    source.apply(&mut config);
    let db = connect(&config, source).await?;

    output::section("Source database");
    output::kv("server", format!("{}:{}", config.database.server, config.database.port));
    output::kv("database", &config.database.name);
    output::kv("user", &config.database.user);

    if let Some(encoded) = source.master_key.as_deref() {
        match crate::core::cipher::MasterKey::parse(encoded.trim()) {
            Ok(key) => output::kv("master key", format!("AES-{}", key.bits())),
            Err(e) => {
                output::kv("master key", "invalid");
                return Err(e);
            }
        }
    }

    eprintln!();
    output::success(&format!("connected to {}", output::name(db.name())));
    Ok(())
}

/// Open the source database and validate the connection.
pub(crate) async fn connect(config: &Config, source: &SourceArgs) -> Result<MssqlSource> {
    config.validate()?;
    config.require_database()?;
    let password = source.password()?;

    let db = MssqlSource::connect(&config.database, password).await?;

    let secs = config.database.connect_timeout_secs;
    tokio::time::timeout(Duration::from_secs(secs), db.ping())
        .await
        .map_err(|_| SourceError::PingTimeout(secs))??;

    info!(server = %config.database.server, "source database reachable");
    Ok(db)
}
