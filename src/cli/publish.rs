//! Publish command.

use tokio_util::sync::CancellationToken;

use crate::cli::{extract, output, DestinationArgs, SourceArgs};
use crate::core::config::Config;
use crate::core::octopus::OctopusClient;
use crate::core::publish::SecretsPublisher;
use crate::error::Result;

/// Extract secrets and publish them as one sensitive variable.
pub async fn execute(
    mut config: Config,
    source: &SourceArgs,
    destination: &DestinationArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    source.apply(&mut config);
    destination.apply(&mut config);
    config.require_destination()?;
    let api = OctopusClient::new(&config.destination, destination.api_key()?)?;

    let extraction = extract::run(&config, source, cancel).await?;
    extract::print_summary(&extraction.summary);

    if cancel.is_cancelled() {
        return Err(crate::error::Error::Cancelled);
    }

    let published = SecretsPublisher::new(&api, config.secrets.reserved.clone())
        .publish(&extraction.payload)
        .await?;

    eprintln!();
    if published.created {
        output::dimmed(&format!(
            "created library variable set {}",
            config.secrets.reserved.container
        ));
    }
    output::success(&format!(
        "published {} secrets to {} in {}",
        extraction.summary.total(),
        output::name(&config.secrets.reserved.variable),
        output::name(&config.secrets.reserved.container)
    ));
    Ok(())
}
