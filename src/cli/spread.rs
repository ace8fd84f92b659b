//! Spread command.
//!
//! Rewrites are irreversible, so a confirmation is asked for unless
//! `--yes` or `--dry-run` is given.

use dialoguer::Confirm;
use tokio_util::sync::CancellationToken;

use crate::cli::{output, DestinationArgs};
use crate::core::config::Config;
use crate::core::octopus::{OctopusClient, VariableApi};
use crate::core::spread::{ScopeSpreader, SpreadReport};
use crate::error::{PublishError, Result};

/// Spread scoped sensitive variables.
pub async fn execute(
    mut config: Config,
    destination: &DestinationArgs,
    set: Option<&str>,
    dry_run: bool,
    yes: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    destination.apply(&mut config);
    config.validate()?;
    config.require_destination()?;
    let api = OctopusClient::new(&config.destination, destination.api_key()?)?;

    if !dry_run && !yes && !confirm(set)? {
        output::dimmed("cancelled");
        return Ok(());
    }

    let spreader = ScopeSpreader::new(&api, config.secrets.reserved.clone()).dry_run(dry_run);
    let report = match set {
        Some(wanted) => {
            let library = api
                .library_variable_sets()
                .await?
                .into_iter()
                .find(|l| l.id.as_deref() == Some(wanted) || l.name == wanted)
                .ok_or_else(|| PublishError::SetNotFound(wanted.to_string()))?;
            spreader.spread_set(&library, cancel).await?
        }
        None => spreader.spread_all(cancel).await?,
    };

    print_report(&report, dry_run);
    Ok(())
}

fn confirm(set: Option<&str>) -> Result<bool> {
    let target = match set {
        Some(set) => format!("library variable set {}", set),
        None => "every library variable set".to_string(),
    };
    Confirm::new()
        .with_prompt(format!(
            "Rename and unscope shared sensitive variables in {}?",
            target
        ))
        .default(false)
        .interact()
        .map_err(Into::into)
}

fn print_report(report: &SpreadReport, dry_run: bool) {
    if !report.renames.is_empty() {
        output::section(if dry_run { "Planned" } else { "Spread" });
        for rename in &report.renames {
            output::list_item(&format!(
                "{}: {} → {}",
                rename.set,
                output::name(&rename.from),
                output::name(&rename.to)
            ));
        }
        eprintln!();
    }

    let verb = if dry_run { "would spread" } else { "spread" };
    output::success(&format!(
        "{} {} variable{} across {} set{}",
        verb,
        report.variables_spread(),
        if report.variables_spread() == 1 { "" } else { "s" },
        report.sets_visited,
        if report.sets_visited == 1 { "" } else { "s" }
    ));
}
