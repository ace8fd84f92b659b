//! Destination server variable API.
//!
//! The [`VariableApi`] trait is the seam between the publisher and spreader
//! and the destination server. [`OctopusClient`] talks to a real server over
//! HTTP; [`InMemoryOctopus`] keeps everything in memory and mirrors the
//! server's handling of sensitive values.
//!
//! Single-variable mutations are read-modify-write of the whole variable
//! set. A sensitive variable written back with no value keeps its stored
//! value, which is how a variable the server never returned the value of can
//! still be renamed.

mod client;
mod memory;

pub use client::OctopusClient;
pub use memory::{ApiCall, InMemoryOctopus};

use async_trait::async_trait;

use crate::core::domain::{LibraryVariableSet, Variable, VariableSet};
use crate::error::Result;

/// Variable-management operations on one space of the destination server.
#[async_trait]
pub trait VariableApi: Send + Sync {
    /// The library variable set named exactly `name`, if any.
    async fn find_library_variable_set(&self, name: &str) -> Result<Option<LibraryVariableSet>>;

    async fn create_library_variable_set(&self, name: &str) -> Result<LibraryVariableSet>;

    /// Every library variable set in the space.
    async fn library_variable_sets(&self) -> Result<Vec<LibraryVariableSet>>;

    /// A variable set. Sensitive values are never returned.
    async fn variable_set(&self, id: &str) -> Result<VariableSet>;

    /// Add `variable` to a set. Its id, if any, is ignored.
    async fn add_variable(&self, set_id: &str, variable: &Variable) -> Result<VariableSet>;

    /// Replace the variable with `variable.id`.
    async fn update_variable(&self, set_id: &str, variable: &Variable) -> Result<VariableSet>;

    async fn delete_variable(&self, set_id: &str, variable_id: &str) -> Result<VariableSet>;
}
