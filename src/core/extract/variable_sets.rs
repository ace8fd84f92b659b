//! Project and library variable sets.
//!
//! Only sensitive variables of unfrozen sets owned by a project or a library
//! variable set are extracted. The variable holding this tool's own
//! published payload is skipped so a previous run's output is never read
//! back as a source secret.

use tracing::trace;

use super::fields;
use super::RowContext;
use crate::core::constants::EXTRACTED_OWNER_TYPES;
use crate::core::domain::{SecretRecord, SENSITIVE_TYPE};
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    if row.is_frozen {
        trace!(record = %row.identity, "skipping frozen variable set");
        return Ok(Vec::new());
    }

    let owner_type = row.owner_type.as_deref().unwrap_or_default();
    if !EXTRACTED_OWNER_TYPES.contains(&owner_type) {
        trace!(record = %row.identity, owner_type, "skipping variable set owner type");
        return Ok(Vec::new());
    }

    let doc = ctx.parse(row)?;
    let Some(variables) = fields::array(&doc, "Variables").optional() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for variable in variables.iter().filter_map(|v| v.as_object()) {
        if fields::string(variable, "Name").optional() == Some(ctx.reserved().variable.as_str()) {
            continue;
        }
        if fields::string(variable, "Type").optional() != Some(SENSITIVE_TYPE) {
            continue;
        }
        let Some(value) = fields::string(variable, "Value").optional() else {
            continue;
        };

        let id = fields::string(variable, "Id").required(ctx, "Variables[].Id")?;
        records.push(ctx.secret(naming::variable_secret(id), value)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::core::extract::EntityKind;
    use crate::core::naming;
    use crate::core::source::{SourceRow, Table};
    use crate::error::{Error, ExtractError};

    fn row(json: String, frozen: bool, owner: &str) -> SourceRow {
        SourceRow::new("variableset-Projects-1", json).with_filters(frozen, owner)
    }

    fn doc() -> String {
        format!(
            r#"{{"Variables":[
                {{"Id":"v-1","Name":"db_password","Type":"Sensitive","Value":"{}"}},
                {{"Id":"v-2","Name":"plain","Type":"String","Value":"hello"}},
                {{"Id":"v-3","Name":"empty","Type":"Sensitive","Value":null}},
                {{"Id":"v-4","Name":"OctoterraWiz.Terraform.Vars","Type":"Sensitive","Value":"{}"}}
            ]}}"#,
            seal("s3cret"),
            seal("previous payload")
        )
    }

    #[test]
    fn test_extracts_sensitive_variables_only() {
        let records = run(EntityKind::VariableSets, Table::VariableSet, &row(doc(), false, "Project")).unwrap();
        assert_eq!(
            records,
            vec![(naming::variable_secret("v-1"), "s3cret".to_string())]
        );
    }

    #[test]
    fn test_library_variable_set_owner_included() {
        let records = run(
            EntityKind::VariableSets,
            Table::VariableSet,
            &row(doc(), false, "LibraryVariableSet"),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_frozen_set_skipped() {
        let records = run(EntityKind::VariableSets, Table::VariableSet, &row(doc(), true, "Project")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_other_owner_types_skipped() {
        let records = run(EntityKind::VariableSets, Table::VariableSet, &row(doc(), false, "Runbook")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_variables_array_skipped() {
        let records = run(
            EntityKind::VariableSets,
            Table::VariableSet,
            &row("{}".to_string(), false, "Project"),
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_sensitive_variable_without_id_is_an_error() {
        let json = format!(
            r#"{{"Variables":[{{"Name":"x","Type":"Sensitive","Value":"{}"}}]}}"#,
            seal("v")
        );
        let err = run(EntityKind::VariableSets, Table::VariableSet, &row(json, false, "Project")).unwrap_err();
        assert!(matches!(
            err,
            Error::Extract(ExtractError::UnexpectedShape {
                field: "Variables[].Id",
                ..
            })
        ));
    }
}
