//! Source database access.
//!
//! Extraction reads one table per secret-bearing entity kind. Every table
//! exposes an identity column and a `JSON` column with the entity's full
//! serialized state; `VariableSet` also carries `IsFrozen` and `OwnerType`.
//!
//! ## Backends
//!
//! - **mssql**: the platform's SQL Server database, via `tiberius`.
//! - **memory**: rows held in memory, for tests and offline runs.

use async_trait::async_trait;

use crate::core::types::RecordId;
use crate::error::Result;

mod memory;
mod mssql;

pub use memory::MemorySource;
pub use mssql::MssqlSource;

/// A source table. All queries are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    VariableSet,
    Account,
    TenantVariable,
    Feed,
    Certificate,
    GitCredential,
    ActionTemplate,
    DeploymentProcess,
    Machine,
    Proxy,
}

impl Table {
    /// Table name in the source schema.
    pub fn name(&self) -> &'static str {
        match self {
            Self::VariableSet => "VariableSet",
            Self::Account => "Account",
            Self::TenantVariable => "TenantVariable",
            Self::Feed => "Feed",
            Self::Certificate => "Certificate",
            Self::GitCredential => "GitCredential",
            Self::ActionTemplate => "ActionTemplate",
            Self::DeploymentProcess => "DeploymentProcess",
            Self::Machine => "Machine",
            Self::Proxy => "Proxy",
        }
    }

    /// Column holding each row's identity.
    pub fn identity_column(&self) -> &'static str {
        match self {
            Self::VariableSet | Self::TenantVariable | Self::GitCredential | Self::ActionTemplate => {
                "Id"
            }
            Self::DeploymentProcess => "OwnerId",
            Self::Account | Self::Feed | Self::Certificate | Self::Machine | Self::Proxy => "Name",
        }
    }

    /// Whether the table carries the `IsFrozen`/`OwnerType` filter columns.
    pub fn has_filters(&self) -> bool {
        matches!(self, Self::VariableSet)
    }

    /// The query reading this table.
    pub fn query(&self) -> String {
        if self.has_filters() {
            format!(
                "SELECT {}, JSON, IsFrozen, OwnerType FROM {}",
                self.identity_column(),
                self.name()
            )
        } else {
            format!("SELECT {}, JSON FROM {}", self.identity_column(), self.name())
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row from a source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    /// Value of the table's identity column.
    pub identity: RecordId,
    /// Serialized entity state.
    pub json: String,
    /// Only populated for `VariableSet`.
    pub is_frozen: bool,
    /// Only populated for `VariableSet`.
    pub owner_type: Option<String>,
}

impl SourceRow {
    pub fn new(identity: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            json: json.into(),
            ..Self::default()
        }
    }

    /// Set the `VariableSet` filter columns.
    pub fn with_filters(mut self, is_frozen: bool, owner_type: impl Into<String>) -> Self {
        self.is_frozen = is_frozen;
        self.owner_type = Some(owner_type.into());
        self
    }
}

/// Read access to the source database.
///
/// Implementations must be safe to share: extraction may call `fetch` for
/// several tables from one handle.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Confirm the database is reachable.
    async fn ping(&self) -> Result<()>;

    /// Read every row of a table.
    async fn fetch(&self, table: Table) -> Result<Vec<SourceRow>>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
