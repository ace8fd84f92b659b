//! Extraction coordinator.
//!
//! Validates the source connection, then runs every extractor in a fixed
//! order and concatenates their output into one variable-definitions payload.
//! The first hard error aborts the run; a partial payload is never returned.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::cipher::MasterKey;
use crate::core::domain::VariableFile;
use crate::core::extract::{self, EntityKind, ExtractOptions};
use crate::core::source::SecretSource;
use crate::error::{Error, Result, SourceError};

/// Lines emitted per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    lines: BTreeMap<EntityKind, usize>,
}

impl ExtractionSummary {
    fn record(&mut self, kind: EntityKind, lines: usize) {
        self.lines.insert(kind, lines);
    }

    /// Lines emitted by `kind`, zero if it emitted none.
    pub fn lines(&self, kind: EntityKind) -> usize {
        self.lines.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.lines.values().sum()
    }

    /// Per-kind counts in run order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, usize)> + '_ {
        EntityKind::ALL.iter().map(|&kind| (kind, self.lines(kind)))
    }
}

/// Output of a successful run.
#[derive(Debug)]
pub struct Extraction {
    pub payload: VariableFile,
    pub summary: ExtractionSummary,
}

/// Runs all extractors against one source.
pub struct Coordinator<'a> {
    source: &'a dyn SecretSource,
    key: &'a MasterKey,
    options: ExtractOptions,
    connect_timeout: Duration,
}

impl<'a> Coordinator<'a> {
    pub fn new(
        source: &'a dyn SecretSource,
        key: &'a MasterKey,
        options: ExtractOptions,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            source,
            key,
            options,
            connect_timeout,
        }
    }

    /// Check the source answers within the connection timeout.
    pub async fn validate(&self) -> Result<()> {
        let secs = self.connect_timeout.as_secs();
        tokio::time::timeout(self.connect_timeout, self.source.ping())
            .await
            .map_err(|_| SourceError::PingTimeout(secs))?
    }

    /// Run every extractor in order.
    ///
    /// `cancel` is checked before each extractor and raced against the one
    /// in flight.
    ///
    /// # Errors
    ///
    /// Returns the first extractor error, a connectivity error if the
    /// source does not answer, or `Error::Cancelled`.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Extraction> {
        let started = Instant::now();
        self.validate().await?;
        debug!(source = self.source.name(), "source connection validated");

        let mut payload = VariableFile::new();
        let mut summary = ExtractionSummary::default();

        for kind in EntityKind::ALL {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let file = tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                result = extract::extract(kind, self.source, self.key, &self.options) => result?,
            };

            debug!(%kind, lines = file.lines(), "extractor finished");
            summary.record(kind, file.lines());
            payload.append(file);
        }

        info!(
            lines = summary.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction complete"
        );
        Ok(Extraction { payload, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::test_support::{key, seal};
    use crate::core::source::{MemorySource, SourceRow, Table};
    use crate::error::ExtractError;

    fn coordinator<'a>(source: &'a MemorySource, key: &'a MasterKey) -> Coordinator<'a> {
        Coordinator::new(source, key, ExtractOptions::default(), Duration::from_secs(10))
    }

    fn populated() -> MemorySource {
        MemorySource::new()
            .with_row(
                Table::Feed,
                SourceRow::new(
                    "NuGet",
                    format!(r#"{{"Name":"NuGet","Password":"{}"}}"#, seal("feedpass")),
                ),
            )
            .with_row(
                Table::Account,
                SourceRow::new(
                    "Azure",
                    format!(r#"{{"Name":"Azure","Password":"{}"}}"#, seal("acct")),
                ),
            )
    }

    #[tokio::test]
    async fn test_run_concatenates_in_kind_order() {
        let source = populated();
        let key = key();
        let extraction = coordinator(&source, &key)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            extraction.payload.as_str(),
            "account_azure = \"acct\"\nfeed_nuget_password = \"feedpass\"\n"
        );
        assert_eq!(extraction.summary.lines(EntityKind::Accounts), 1);
        assert_eq!(extraction.summary.lines(EntityKind::Feeds), 1);
        assert_eq!(extraction.summary.lines(EntityKind::Machines), 0);
        assert_eq!(extraction.summary.total(), 2);
    }

    #[tokio::test]
    async fn test_every_table_queried_once() {
        let source = MemorySource::new();
        let key = key();
        coordinator(&source, &key)
            .run(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(source.fetched().len(), 10);
    }

    #[tokio::test]
    async fn test_unreachable_source_fails_before_extracting() {
        let source = populated().unreachable();
        let key = key();
        let err = coordinator(&source, &key)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Source(SourceError::Connect(_))));
        assert!(source.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_first_error_aborts_run() {
        let source = populated().failing(Table::TenantVariable);
        let key = key();
        let err = coordinator(&source, &key)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Extract(ExtractError::Source {
                kind: EntityKind::TenantVariables,
                ..
            })
        ));
        assert!(!source.fetched().contains(&Table::Feed));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = populated();
        let key = key();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = coordinator(&source, &key).run(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(source.fetched().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_stalled_extractor() {
        let source = populated().stalled(Table::Certificate);
        let key = key();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let err = coordinator(&source, &key).run(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
