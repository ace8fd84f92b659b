//! Entity extractors.
//!
//! One extractor per secret-bearing entity kind. Each reads its source
//! table(s), locates sensitive fields in the row JSON, decrypts them and
//! names them. Kinds form a closed set: adding a kind means adding a variant
//! and its row handler.
//!
//! Rows without a matching field are skipped silently, since most records of
//! a secret-bearing kind carry no secret. A field the kind always carries
//! being absent is an `UnexpectedShape` error.

mod accounts;
mod certificates;
mod feeds;
pub(crate) mod fields;
mod git_credentials;
mod machines;
mod processes;
mod step_templates;
mod tenants;
mod variable_sets;

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::core::cipher::{self, MasterKey, PaddingMode};
use crate::core::config::ReservedNames;
use crate::core::constants;
use crate::core::domain::{SecretRecord, VariableFile};
use crate::core::source::{SecretSource, SourceRow, Table};
use crate::error::{Error, ExtractError, Result, SourceError};

use fields::Object;

/// A secret-bearing entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    VariableSets,
    Accounts,
    TenantVariables,
    Feeds,
    Certificates,
    GitCredentials,
    StepTemplates,
    DeploymentProcesses,
    Machines,
}

impl EntityKind {
    /// Every kind, in the order a run extracts them.
    pub const ALL: [EntityKind; 9] = [
        Self::VariableSets,
        Self::Accounts,
        Self::TenantVariables,
        Self::Feeds,
        Self::Certificates,
        Self::GitCredentials,
        Self::StepTemplates,
        Self::DeploymentProcesses,
        Self::Machines,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::VariableSets => "variable sets",
            Self::Accounts => "accounts",
            Self::TenantVariables => "tenant variables",
            Self::Feeds => "feeds",
            Self::Certificates => "certificates",
            Self::GitCredentials => "git credentials",
            Self::StepTemplates => "step templates",
            Self::DeploymentProcesses => "deployment processes",
            Self::Machines => "machines",
        }
    }

    /// Source tables read by this kind.
    pub fn tables(&self) -> &'static [Table] {
        match self {
            Self::VariableSets => &[Table::VariableSet],
            Self::Accounts => &[Table::Account],
            Self::TenantVariables => &[Table::TenantVariable],
            Self::Feeds => &[Table::Feed],
            Self::Certificates => &[Table::Certificate],
            Self::GitCredentials => &[Table::GitCredential],
            Self::StepTemplates => &[Table::ActionTemplate],
            Self::DeploymentProcesses => &[Table::DeploymentProcess],
            Self::Machines => &[Table::Machine, Table::Proxy],
        }
    }

    /// Extract the secrets of one row.
    pub fn extract_row(&self, ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
        match self {
            Self::VariableSets => variable_sets::extract(ctx, row),
            Self::Accounts => accounts::extract(ctx, row),
            Self::TenantVariables => tenants::extract(ctx, row),
            Self::Feeds => feeds::extract(ctx, row),
            Self::Certificates => certificates::extract(ctx, row),
            Self::GitCredentials => git_credentials::extract(ctx, row),
            Self::StepTemplates => step_templates::extract(ctx, row),
            Self::DeploymentProcesses => processes::extract(ctx, row),
            Self::Machines => machines::extract(ctx, row),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings shared by every extractor in a run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub padding: PaddingMode,
    pub reserved: ReservedNames,
    pub query_timeout: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            padding: PaddingMode::default(),
            reserved: ReservedNames::default(),
            query_timeout: Duration::from_secs(constants::QUERY_TIMEOUT_SECS),
        }
    }
}

/// Everything a row handler needs: the key, the options, and enough
/// context to label errors.
pub struct RowContext<'a> {
    pub kind: EntityKind,
    pub table: Table,
    pub record: &'a str,
    key: &'a MasterKey,
    options: &'a ExtractOptions,
}

impl<'a> RowContext<'a> {
    pub fn new(
        kind: EntityKind,
        table: Table,
        record: &'a str,
        key: &'a MasterKey,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            kind,
            table,
            record,
            key,
            options,
        }
    }

    pub fn reserved(&self) -> &ReservedNames {
        &self.options.reserved
    }

    /// Parse the row JSON, which must be an object.
    pub(crate) fn parse(&self, row: &SourceRow) -> Result<Object> {
        let value: Value =
            serde_json::from_str(&row.json).map_err(|source| ExtractError::InvalidJson {
                kind: self.kind,
                record: self.record.to_string(),
                source,
            })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(self.unexpected_shape("<root>")),
        }
    }

    /// Decrypt `encrypted` and name it.
    pub(crate) fn secret(&self, name: String, encrypted: &str) -> Result<SecretRecord> {
        let value =
            cipher::decrypt_with(self.key, encrypted, self.options.padding).map_err(|e| match e {
                Error::Cipher(source) => ExtractError::Decrypt {
                    kind: self.kind,
                    record: self.record.to_string(),
                    source,
                }
                .into(),
                other => other,
            })?;
        trace!(kind = %self.kind, %name, value_len = value.len(), "extracted secret");
        Ok(SecretRecord::new(name, value))
    }

    pub(crate) fn unexpected_shape(&self, field: &'static str) -> Error {
        ExtractError::UnexpectedShape {
            kind: self.kind,
            record: self.record.to_string(),
            field,
        }
        .into()
    }
}

/// Run one extractor against a source.
///
/// Each table query is bounded by `options.query_timeout`.
///
/// # Errors
///
/// Returns an `ExtractError` labelled with `kind` for query failures,
/// timeouts, invalid row data or decryption failures.
pub async fn extract(
    kind: EntityKind,
    source: &dyn SecretSource,
    key: &MasterKey,
    options: &ExtractOptions,
) -> Result<VariableFile> {
    let mut file = VariableFile::new();

    for &table in kind.tables() {
        let rows = fetch(kind, table, source, options.query_timeout).await?;

        for row in &rows {
            let ctx = RowContext::new(kind, table, &row.identity, key, options);
            for record in kind.extract_row(&ctx, row)? {
                file.push(&record);
            }
        }
        debug!(%kind, %table, rows = rows.len(), lines = file.lines(), "extracted table");
    }

    Ok(file)
}

async fn fetch(
    kind: EntityKind,
    table: Table,
    source: &dyn SecretSource,
    timeout: Duration,
) -> Result<Vec<SourceRow>> {
    let with_kind = |source: SourceError| -> Error { ExtractError::Source { kind, source }.into() };

    match tokio::time::timeout(timeout, source.fetch(table)).await {
        Ok(Ok(rows)) => Ok(rows),
        Ok(Err(Error::Source(e))) => Err(with_kind(e)),
        Ok(Err(other)) => Err(other),
        Err(_) => Err(with_kind(SourceError::Timeout {
            table,
            secs: timeout.as_secs(),
        })),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    pub const KEY: &str = "6EdU6IWsCtMEwk0kPKflQQ==";

    pub fn key() -> MasterKey {
        MasterKey::parse(KEY).unwrap()
    }

    /// Encrypt like the source platform does.
    pub fn seal(plaintext: &str) -> String {
        let iv = STANDARD.decode("7oD+XzuTFF1uCQLXm8A3eg==").unwrap();
        cipher::encrypt(&key(), &iv, plaintext).unwrap()
    }

    /// Run one kind's row handler and collect `(name, value)` pairs.
    pub fn run(kind: EntityKind, table: Table, row: &SourceRow) -> Result<Vec<(String, String)>> {
        let key = key();
        let options = ExtractOptions::default();
        let ctx = RowContext::new(kind, table, &row.identity, &key, &options);
        Ok(kind
            .extract_row(&ctx, row)?
            .into_iter()
            .map(|r| (r.name().to_string(), r.value().to_string()))
            .collect())
    }
}
