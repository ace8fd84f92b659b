//! In-memory source.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{SecretSource, SourceRow, Table};
use crate::error::{Result, SourceError};

/// Source rows held in memory.
///
/// Tables never populated read as empty. Individual tables can be made to
/// fail or to hang, and the whole source can be made unreachable.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: HashMap<Table, Vec<SourceRow>>,
    failing: HashSet<Table>,
    stalled: HashSet<Table>,
    unreachable: bool,
    fetched: Mutex<Vec<Table>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to a table.
    pub fn with_row(mut self, table: Table, row: SourceRow) -> Self {
        self.rows.entry(table).or_default().push(row);
        self
    }

    /// Make queries against `table` fail.
    pub fn failing(mut self, table: Table) -> Self {
        self.failing.insert(table);
        self
    }

    /// Make queries against `table` never complete.
    pub fn stalled(mut self, table: Table) -> Self {
        self.stalled.insert(table);
        self
    }

    /// Make `ping` fail.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Tables fetched so far, in call order.
    pub fn fetched(&self) -> Vec<Table> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SecretSource for MemorySource {
    async fn ping(&self) -> Result<()> {
        if self.unreachable {
            return Err(SourceError::Connect("memory source is unreachable".to_string()).into());
        }
        Ok(())
    }

    async fn fetch(&self, table: Table) -> Result<Vec<SourceRow>> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(table);
        }

        if self.failing.contains(&table) {
            return Err(SourceError::Query {
                table,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        if self.stalled.contains(&table) {
            std::future::pending::<()>().await;
        }

        Ok(self.rows.get(&table).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
