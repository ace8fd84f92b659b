//! Scope spreader.
//!
//! Rewrites library variable sets so no sensitive variable name is bound to
//! several scoped values. For each scoped sensitive variable whose name is
//! shared with another variable:
//!
//! 1. a plain reference variable is created with the original name and
//!    scope, whose value is `#{<unique name>}`;
//! 2. the original is renamed to the unique name and unscoped, keeping its
//!    secret value on the server.
//!
//! A deployment resolving the original name in the original scope reaches
//! the same secret through the reference. The reference is created before
//! the rename so the original name never resolves to nothing.
//!
//! Rewritten variables no longer match (the reference is not sensitive, the
//! renamed original is unscoped), so a second pass is a no-op. A pass
//! interrupted between the two calls leaves a reference whose target does
//! not exist yet; the next pass adopts that reference and only renames.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::config::ReservedNames;
use crate::core::domain::{LibraryVariableSet, Variable, VariableScope, VariableSet, STRING_TYPE};
use crate::core::octopus::VariableApi;
use crate::error::{Error, PublishError, Result, SpreadError};

/// One variable to spread.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadStep {
    pub original_name: String,
    pub unique_name: String,
    /// Created first: original name and scope, plain, pointing at
    /// `unique_name`. `None` when an earlier pass already created it.
    pub reference: Option<Variable>,
    /// Written second: the original renamed and unscoped
    pub renamed: Variable,
}

/// A rename made (or planned, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub set: String,
    pub from: String,
    pub to: String,
}

/// Outcome of a spreading pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadReport {
    pub sets_visited: usize,
    pub renames: Vec<Rename>,
}

impl SpreadReport {
    pub fn variables_spread(&self) -> usize {
        self.renames.len()
    }
}

/// Build the steps for one variable set without touching the server.
///
/// # Errors
///
/// Returns `SpreadError::InvariantViolation` if a variable to be renamed
/// carries a value, `PublishError::MissingId` if it has no id, or
/// `SpreadError::ScopeSnapshot` if its scope cannot be recorded.
pub fn plan(set: &VariableSet) -> Result<Vec<SpreadStep>> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for variable in &set.variables {
        *occurrences.entry(variable.name.as_str()).or_default() += 1;
    }

    let spreadable = |v: &Variable| v.is_secret() && !v.scope.is_empty();

    let mut colliding: Vec<&str> = Vec::new();
    for variable in &set.variables {
        let name = variable.name.as_str();
        if spreadable(variable) && occurrences[name] > 1 && !colliding.contains(&name) {
            colliding.push(name);
        }
    }

    let mut used: HashSet<String> = set.variables.iter().map(|v| v.name.clone()).collect();
    let mut steps = Vec::new();

    for name in colliding {
        for variable in set
            .variables
            .iter()
            .filter(|v| v.name == name && spreadable(*v))
        {
            let id = variable.id.clone().ok_or_else(|| PublishError::MissingId {
                set: set.id.clone(),
                name: variable.name.clone(),
            })?;
            if variable.value.is_some() {
                return Err(SpreadError::InvariantViolation {
                    name: variable.name.clone(),
                    id,
                }
                .into());
            }

            let adopted = set
                .variables
                .iter()
                .filter(|r| r.name == variable.name && r.scope == variable.scope)
                .filter_map(reference_target)
                .find(|target| !used.contains(*target))
                .map(str::to_string);

            let planned = match adopted {
                Some(target) => {
                    debug!(name = %variable.name, %target, "adopting existing reference");
                    used.insert(target.clone());
                    let mut planned = step(variable, &id, target)?;
                    planned.reference = None;
                    planned
                }
                None => {
                    let unique_name = unique_name(variable, &used);
                    used.insert(unique_name.clone());
                    step(variable, &id, unique_name)?
                }
            };
            steps.push(planned);
        }
    }

    Ok(steps)
}

/// Append the first value of each scope dimension to the name, then a
/// numeric suffix until the result is unused.
pub fn unique_name(variable: &Variable, used: &HashSet<String>) -> String {
    let mut base = variable.name.clone();
    for value in variable.scope.first_values() {
        base.push('_');
        base.push_str(value);
    }

    let mut candidate = base.clone();
    let mut index = 1;
    while used.contains(&candidate) {
        candidate = format!("{}_{}", base, index);
        index += 1;
    }
    candidate
}

/// Target of a plain `#{target}` reference variable.
fn reference_target(variable: &Variable) -> Option<&str> {
    if variable.is_sensitive {
        return None;
    }
    variable
        .value
        .as_deref()?
        .strip_prefix("#{")?
        .strip_suffix('}')
        .filter(|target| !target.is_empty())
}

/// JSON snapshot of a scope, kept in the description of both derived
/// variables.
fn scope_snapshot(scope: &VariableScope) -> Result<String> {
    serde_json::to_string(scope).map_err(|e| SpreadError::ScopeSnapshot(e).into())
}

fn step(original: &Variable, id: &str, unique_name: String) -> Result<SpreadStep> {
    let scope = scope_snapshot(&original.scope)?;

    let mut reference = original.clone();
    reference.id = None;
    reference.is_sensitive = false;
    reference.kind = STRING_TYPE.to_string();
    reference.value = Some(format!("#{{{}}}", unique_name));
    reference.annotate("Replaced variable ID", id);
    reference.annotate("Original Scope", &scope);

    let mut renamed = original.clone();
    renamed.name = unique_name.clone();
    renamed.scope = Default::default();
    renamed.annotate("Original Name", &original.name);
    renamed.annotate("Original Scope", &scope);

    Ok(SpreadStep {
        original_name: original.name.clone(),
        unique_name,
        reference: Some(reference),
        renamed,
    })
}

/// Applies spreading to library variable sets on the destination server.
pub struct ScopeSpreader<'a> {
    api: &'a dyn VariableApi,
    reserved: ReservedNames,
    dry_run: bool,
}

impl<'a> ScopeSpreader<'a> {
    pub fn new(api: &'a dyn VariableApi, reserved: ReservedNames) -> Self {
        Self {
            api,
            reserved,
            dry_run: false,
        }
    }

    /// Plan without mutating anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Spread every library variable set in the space.
    ///
    /// Stops at the first error. Sets already processed stay processed.
    pub async fn spread_all(&self, cancel: &CancellationToken) -> Result<SpreadReport> {
        let mut report = SpreadReport::default();
        for library in self.api.library_variable_sets().await? {
            if library.name == self.reserved.container {
                debug!(name = %library.name, "skipping secrets container");
                continue;
            }
            self.spread_into(&library, cancel, &mut report).await?;
        }
        info!(
            sets = report.sets_visited,
            spread = report.variables_spread(),
            dry_run = self.dry_run,
            "spreading complete"
        );
        Ok(report)
    }

    /// Spread one library variable set.
    pub async fn spread_set(
        &self,
        library: &LibraryVariableSet,
        cancel: &CancellationToken,
    ) -> Result<SpreadReport> {
        let mut report = SpreadReport::default();
        self.spread_into(library, cancel, &mut report).await?;
        Ok(report)
    }

    async fn spread_into(
        &self,
        library: &LibraryVariableSet,
        cancel: &CancellationToken,
        report: &mut SpreadReport,
    ) -> Result<()> {
        let set_id = library
            .variable_set_id
            .as_deref()
            .ok_or_else(|| PublishError::SetNotFound(library.name.clone()))?;

        let set = self.api.variable_set(set_id).await?;
        let steps = plan(&set)?;
        debug!(set = %library.name, steps = steps.len(), "planned spreading");

        report.sets_visited += 1;
        if self.dry_run {
            report
                .renames
                .extend(steps.iter().map(|s| rename(&library.name, s)));
            return Ok(());
        }

        for step in &steps {
            self.apply(set_id, step, cancel).await?;
            report.renames.push(rename(&library.name, step));
        }
        Ok(())
    }

    /// Create the reference unless an earlier pass left one, then rename
    /// the original.
    pub async fn apply(
        &self,
        set_id: &str,
        step: &SpreadStep,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(reference) = &step.reference {
            info!(
                name = %step.original_name,
                reference = %step.unique_name,
                "recreating variable as reference"
            );
            self.api.add_variable(set_id, reference).await?;
        }

        info!(
            from = %step.original_name,
            to = %step.unique_name,
            "renaming and unscoping variable"
        );
        self.api.update_variable(set_id, &step.renamed).await?;
        Ok(())
    }
}

fn rename(set: &str, step: &SpreadStep) -> Rename {
    Rename {
        set: set.to_string(),
        from: step.original_name.clone(),
        to: step.unique_name.clone(),
    }
}
