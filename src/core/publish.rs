//! Secrets publisher.
//!
//! Writes the extracted payload to the destination server as the single
//! sensitive variable of a well-known library variable set. Publishing is
//! idempotent: every earlier copy of the payload variable is deleted before
//! the new one is added.

use tracing::{debug, info};

use crate::core::config::ReservedNames;
use crate::core::domain::{LibraryVariableSet, Variable, VariableFile};
use crate::core::octopus::VariableApi;
use crate::error::{PublishError, Result};

/// Where a payload was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub library_variable_set: String,
    pub variable_set: String,
    /// Whether the container had to be created
    pub created: bool,
    /// Earlier payload variables removed
    pub replaced: usize,
}

pub struct SecretsPublisher<'a> {
    api: &'a dyn VariableApi,
    reserved: ReservedNames,
}

impl<'a> SecretsPublisher<'a> {
    pub fn new(api: &'a dyn VariableApi, reserved: ReservedNames) -> Self {
        Self { api, reserved }
    }

    /// Publish `payload`.
    ///
    /// # Errors
    ///
    /// Returns a `PublishError` for any failed server call. A failure after
    /// the old variable was deleted leaves the container without a payload
    /// until the next successful run.
    pub async fn publish(&self, payload: &VariableFile) -> Result<Published> {
        let (library, created) = self.container().await?;
        let set_id = library
            .variable_set_id
            .clone()
            .ok_or_else(|| PublishError::SetNotFound(library.name.clone()))?;

        let set = self.api.variable_set(&set_id).await?;
        let stale: Vec<String> = set
            .variables
            .iter()
            .filter(|v| v.name == self.reserved.variable)
            .filter_map(|v| v.id.clone())
            .collect();

        for id in &stale {
            debug!(set = %set_id, variable = %id, "deleting previous payload");
            self.api.delete_variable(&set_id, id).await?;
        }

        let variable = Variable::sensitive(&self.reserved.variable, payload.as_str());
        self.api.add_variable(&set_id, &variable).await?;

        info!(
            set = %set_id,
            lines = payload.lines(),
            replaced = stale.len(),
            "published secrets payload"
        );
        Ok(Published {
            library_variable_set: library.id.unwrap_or_default(),
            variable_set: set_id,
            created,
            replaced: stale.len(),
        })
    }

    async fn container(&self) -> Result<(LibraryVariableSet, bool)> {
        let name = &self.reserved.container;
        match self.api.find_library_variable_set(name).await? {
            Some(existing) => Ok((existing, false)),
            None => {
                debug!(%name, "creating secrets container");
                Ok((self.api.create_library_variable_set(name).await?, true))
            }
        }
    }
}
