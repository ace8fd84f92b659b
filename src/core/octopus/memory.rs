//! In-memory destination server.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::VariableApi;
use crate::core::domain::{LibraryVariableSet, Variable, VariableSet};
use crate::error::{PublishError, Result};

/// A mutating call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateLibraryVariableSet { name: String },
    Add { set: String, name: String },
    Update { set: String, name: String },
    Delete { set: String, id: String },
}

#[derive(Debug, Default)]
struct State {
    libraries: Vec<LibraryVariableSet>,
    sets: BTreeMap<String, VariableSet>,
    next_id: u64,
    calls: Vec<ApiCall>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn set_mut(&mut self, id: &str) -> Result<&mut VariableSet> {
        self.sets
            .get_mut(id)
            .ok_or_else(|| PublishError::SetNotFound(id.to_string()).into())
    }
}

/// Destination server held in memory.
///
/// Like the real server, reads never return sensitive values and writing a
/// sensitive variable back without a value keeps the stored one.
#[derive(Debug, Default)]
pub struct InMemoryOctopus {
    state: Mutex<State>,
}

impl InMemoryOctopus {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a library variable set holding `variables`, assigning ids to
    /// any that lack one. Not recorded as a call.
    pub fn seed(&self, name: &str, variables: Vec<Variable>) -> LibraryVariableSet {
        let mut state = self.state();
        let library = new_library(&mut state, name);
        if let Some(set_id) = library.variable_set_id.as_deref() {
            let mut variables = variables;
            for variable in &mut variables {
                if variable.id.is_none() {
                    variable.id = Some(state.next_id("Variables"));
                }
            }
            if let Some(set) = state.sets.get_mut(set_id) {
                set.variables = variables;
            }
        }
        library
    }

    /// Mutating calls made so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// A variable set with sensitive values included.
    pub fn stored(&self, set_id: &str) -> Option<VariableSet> {
        self.state().sets.get(set_id).cloned()
    }

    /// Resolve `name` as a deployment would for a given scope: the variable
    /// whose scope matches, with `#{...}` references followed.
    ///
    /// `environment` of `None` matches only unscoped variables.
    pub fn resolve(&self, set_id: &str, name: &str, environment: Option<&str>) -> Option<String> {
        let set = self.stored(set_id)?;
        resolve_in(&set, name, environment, 0)
    }
}

fn resolve_in(set: &VariableSet, name: &str, environment: Option<&str>, depth: u8) -> Option<String> {
    if depth > 8 {
        return None;
    }
    let scoped = environment.and_then(|env| {
        set.variables
            .iter()
            .find(|v| v.name == name && v.scope.environment.iter().any(|e| e == env))
    });
    let variable = scoped.or_else(|| {
        set.variables
            .iter()
            .find(|v| v.name == name && v.scope.is_empty())
    })?;

    let value = variable.value.clone()?;
    match value
        .strip_prefix("#{")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(target) => resolve_in(set, target, environment, depth + 1),
        None => Some(value),
    }
}

fn new_library(state: &mut State, name: &str) -> LibraryVariableSet {
    let id = state.next_id("LibraryVariableSets");
    let set_id = format!("variableset-{}", id);

    let mut library = LibraryVariableSet::new(name);
    library.id = Some(id.clone());
    library.variable_set_id = Some(set_id.clone());

    state.sets.insert(
        set_id.clone(),
        VariableSet {
            id: set_id,
            owner_id: Some(id),
            ..VariableSet::default()
        },
    );
    state.libraries.push(library.clone());
    library
}

/// The set as the server would return it.
fn redacted(set: &VariableSet) -> VariableSet {
    let mut set = set.clone();
    for variable in &mut set.variables {
        if variable.is_sensitive {
            variable.value = None;
        }
    }
    set
}

#[async_trait]
impl VariableApi for InMemoryOctopus {
    async fn find_library_variable_set(&self, name: &str) -> Result<Option<LibraryVariableSet>> {
        Ok(self
            .state()
            .libraries
            .iter()
            .find(|l| l.name == name)
            .cloned())
    }

    async fn create_library_variable_set(&self, name: &str) -> Result<LibraryVariableSet> {
        let mut state = self.state();
        state.calls.push(ApiCall::CreateLibraryVariableSet {
            name: name.to_string(),
        });
        Ok(new_library(&mut state, name))
    }

    async fn library_variable_sets(&self) -> Result<Vec<LibraryVariableSet>> {
        Ok(self.state().libraries.clone())
    }

    async fn variable_set(&self, id: &str) -> Result<VariableSet> {
        let mut state = self.state();
        let set = state.set_mut(id)?;
        Ok(redacted(set))
    }

    async fn add_variable(&self, set_id: &str, variable: &Variable) -> Result<VariableSet> {
        let mut state = self.state();
        let id = state.next_id("Variables");
        let mut variable = variable.clone();
        variable.id = Some(id);

        state.calls.push(ApiCall::Add {
            set: set_id.to_string(),
            name: variable.name.clone(),
        });
        let set = state.set_mut(set_id)?;
        set.variables.push(variable);
        set.version += 1;
        Ok(redacted(set))
    }

    async fn update_variable(&self, set_id: &str, variable: &Variable) -> Result<VariableSet> {
        let id = variable.id.clone().ok_or_else(|| PublishError::MissingId {
            set: set_id.to_string(),
            name: variable.name.clone(),
        })?;

        let mut state = self.state();
        state.calls.push(ApiCall::Update {
            set: set_id.to_string(),
            name: variable.name.clone(),
        });
        let set = state.set_mut(set_id)?;
        let slot = set
            .variables
            .iter_mut()
            .find(|v| v.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| PublishError::VariableNotFound {
                set: set_id.to_string(),
                id: id.clone(),
            })?;

        let kept = match (&variable.value, variable.is_sensitive) {
            (None, true) => slot.value.take(),
            _ => variable.value.clone(),
        };
        *slot = variable.clone();
        slot.value = kept;
        set.version += 1;
        Ok(redacted(set))
    }

    async fn delete_variable(&self, set_id: &str, variable_id: &str) -> Result<VariableSet> {
        let mut state = self.state();
        state.calls.push(ApiCall::Delete {
            set: set_id.to_string(),
            id: variable_id.to_string(),
        });
        let set = state.set_mut(set_id)?;
        let before = set.variables.len();
        set.variables.retain(|v| v.id.as_deref() != Some(variable_id));
        if set.variables.len() == before {
            return Err(PublishError::VariableNotFound {
                set: set_id.to_string(),
                id: variable_id.to_string(),
            }
            .into());
        }
        set.version += 1;
        Ok(redacted(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_reads_hide_sensitive_values() {
        let api = InMemoryOctopus::new();
        let library = api.seed(
            "Shared",
            vec![
                Variable::sensitive("db_password", "hunter2"),
                Variable {
                    value: Some("plain".into()),
                    ..Variable::new("region")
                },
            ],
        );
        let set_id = library.variable_set_id.unwrap();

        let set = api.variable_set(&set_id).await.unwrap();
        assert_eq!(set.variables[0].value, None);
        assert_eq!(set.variables[1].value.as_deref(), Some("plain"));

        let stored = api.stored(&set_id).unwrap();
        assert_eq!(stored.variables[0].value.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn test_update_without_value_keeps_secret() {
        let api = InMemoryOctopus::new();
        let set_id = api
            .seed("Shared", vec![Variable::sensitive("db_password", "hunter2")])
            .variable_set_id
            .unwrap();

        let mut variable = api.variable_set(&set_id).await.unwrap().variables.remove(0);
        variable.name = "db_password_prod".into();
        api.update_variable(&set_id, &variable).await.unwrap();

        assert_eq!(
            api.resolve(&set_id, "db_password_prod", None).as_deref(),
            Some("hunter2")
        );
    }

    #[tokio::test]
    async fn test_calls_recorded_in_order() {
        let api = InMemoryOctopus::new();
        let library = api.create_library_variable_set("Secrets").await.unwrap();
        let set_id = library.variable_set_id.unwrap();
        let set = api
            .add_variable(&set_id, &Variable::sensitive("x", "1"))
            .await
            .unwrap();
        let id = set.variables[0].id.clone().unwrap();
        api.delete_variable(&set_id, &id).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::CreateLibraryVariableSet {
                    name: "Secrets".into()
                },
                ApiCall::Add {
                    set: set_id.clone(),
                    name: "x".into()
                },
                ApiCall::Delete { set: set_id, id },
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_set() {
        let api = InMemoryOctopus::new();
        let err = api.variable_set("variableset-nope").await.unwrap_err();
        assert!(matches!(err, Error::Publish(PublishError::SetNotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_follows_references_by_scope() {
        let api = InMemoryOctopus::new();
        let mut reference = Variable::new("db_password");
        reference.value = Some("#{db_password_prod}".into());
        reference.scope.environment = vec!["Environments-1".into()];
        let set_id = api
            .seed(
                "Shared",
                vec![reference, Variable::sensitive("db_password_prod", "s3cret")],
            )
            .variable_set_id
            .unwrap();

        assert_eq!(
            api.resolve(&set_id, "db_password", Some("Environments-1")).as_deref(),
            Some("s3cret")
        );
        assert_eq!(api.resolve(&set_id, "db_password", Some("Environments-2")), None);
    }
}
