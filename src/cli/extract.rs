//! Extract command.
//!
//! Runs every extractor and writes the variable-definitions file to a file
//! or stdout.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cli::{check, output, SourceArgs};
use crate::core::config::Config;
use crate::core::coordinator::{Coordinator, Extraction, ExtractionSummary};
use crate::core::extract::ExtractOptions;
use crate::error::Result;

/// Extract secrets.
pub async fn execute(
    mut config: Config,
    source: &SourceArgs,
    out: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    source.apply(&mut config);
    let extraction = run(&config, source, cancel).await?;
    if extraction.payload.is_empty() {
        output::warn("no secrets found; the payload is empty");
    }

    match out {
        Some(path) => {
            write_private(path, extraction.payload.as_str().as_bytes())?;
            print_summary(&extraction.summary);
            output::success(&format!(
                "wrote {} secrets to {}",
                extraction.summary.total(),
                output::path(&path.display().to_string())
            ));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(extraction.payload.as_str().as_bytes())?;
            stdout.flush()?;
            print_summary(&extraction.summary);
        }
    }
    Ok(())
}

/// Connect and run every extractor.
pub(crate) async fn run(
    config: &Config,
    source: &SourceArgs,
    cancel: &CancellationToken,
) -> Result<Extraction> {
    let key = source.master_key()?;
    let db = check::connect(config, source).await?;

    let options = ExtractOptions {
        padding: config.secrets.padding,
        reserved: config.secrets.reserved.clone(),
        query_timeout: Duration::from_secs(config.database.query_timeout_secs),
    };
    let connect_timeout = Duration::from_secs(config.database.connect_timeout_secs);

    Coordinator::new(&db, &key, options, connect_timeout)
        .run(cancel)
        .await
}

pub(crate) fn print_summary(summary: &ExtractionSummary) {
    output::section("Extracted");
    for (kind, lines) in summary.iter() {
        output::kv(&format!("{}:", kind), lines);
    }
    output::rule();
    output::kv("total:", summary.total());
}

/// Write `contents` readable by the owner only.
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // `mode` only applies on creation; an existing file is narrowed before
    // anything is written to it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    Ok(())
}
