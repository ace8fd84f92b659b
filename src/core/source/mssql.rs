//! SQL Server source backend.
//!
//! Uses a single connection guarded by an async mutex. Extractors run one
//! after another, so one connection is all a run needs and the source server
//! sees a single session.

use std::time::Duration;

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, trace};

use super::{SecretSource, SourceRow, Table};
use crate::core::config::DatabaseConfig;
use crate::error::{Result, SourceError};

type Connection = Client<Compat<TcpStream>>;

/// The source platform's SQL Server database.
pub struct MssqlSource {
    client: Mutex<Connection>,
}

impl MssqlSource {
    /// Open a connection, giving up after the configured connection timeout.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Connect` if the server is unreachable, rejects
    /// the login, or does not answer in time.
    pub async fn connect(settings: &DatabaseConfig, password: &str) -> Result<Self> {
        let secs = settings.connect_timeout_secs;
        debug!(
            server = %settings.server,
            port = settings.port,
            database = %settings.name,
            "connecting to source database"
        );

        tokio::time::timeout(Duration::from_secs(secs), Self::open(settings, password))
            .await
            .map_err(|_| SourceError::Connect(format!("timed out after {}s", secs)))?
    }

    async fn open(settings: &DatabaseConfig, password: &str) -> Result<Self> {
        let mut config = Config::new();
        config.host(&settings.server);
        config.port(settings.port);
        config.database(&settings.name);
        config.authentication(AuthMethod::sql_server(&settings.user, password));
        if settings.trust_cert {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| SourceError::Connect(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| SourceError::Connect(e.to_string()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| SourceError::Connect(e.to_string()))?;

        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

fn text(row: &Row, index: usize, table: Table, column: &'static str) -> Result<Option<String>> {
    row.try_get::<&str, _>(index)
        .map(|v| v.map(str::to_string))
        .map_err(|_| SourceError::Column { table, column }.into())
}

fn to_source_row(row: &Row, table: Table) -> Result<SourceRow> {
    let identity = text(row, 0, table, table.identity_column())?.unwrap_or_default();
    let json = text(row, 1, table, "JSON")?.unwrap_or_default();

    let mut source_row = SourceRow::new(identity, json);
    if table.has_filters() {
        source_row.is_frozen = row
            .try_get::<bool, _>(2)
            .map_err(|_| SourceError::Column {
                table,
                column: "IsFrozen",
            })?
            .unwrap_or(false);
        source_row.owner_type = text(row, 3, table, "OwnerType")?;
    }
    Ok(source_row)
}

#[async_trait]
impl SecretSource for MssqlSource {
    async fn ping(&self) -> Result<()> {
        let mut client = self.client.lock().await;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| SourceError::Connect(e.to_string()))?
            .into_results()
            .await
            .map_err(|e| SourceError::Connect(e.to_string()))?;
        Ok(())
    }

    async fn fetch(&self, table: Table) -> Result<Vec<SourceRow>> {
        let query = table.query();
        trace!(%table, %query, "querying source table");

        let mut client = self.client.lock().await;
        let rows = client
            .simple_query(query)
            .await
            .map_err(|e| SourceError::Query {
                table,
                reason: e.to_string(),
            })?
            .into_first_result()
            .await
            .map_err(|e| SourceError::Query {
                table,
                reason: e.to_string(),
            })?;

        debug!(%table, rows = rows.len(), "fetched source rows");
        rows.iter().map(|row| to_source_row(row, table)).collect()
    }

    fn name(&self) -> &'static str {
        "mssql"
    }
}
