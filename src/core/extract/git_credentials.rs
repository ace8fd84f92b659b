//! Source-control credentials.

use super::fields::{self, Lookup};
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;

    // Older schema versions serialize the details object in camel case.
    let details = match fields::object(&doc, "Details") {
        Lookup::Missing => fields::object(&doc, "details"),
        found => found,
    }
    .required(ctx, "Details")?;

    match fields::string(details, "Password").optional() {
        Some(password) => Ok(vec![ctx.secret(
            naming::git_credential_secret(&row.identity),
            password,
        )?]),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::core::extract::EntityKind;
    use crate::core::naming;
    use crate::core::source::{SourceRow, Table};
    use crate::error::{Error, ExtractError};

    #[test]
    fn test_git_credential_password() {
        let row = SourceRow::new(
            "GitCredentials-1",
            format!(
                r#"{{"Name":"GitHub","details":{{"Type":"UsernamePassword","Username":"bot","Password":"{}"}}}}"#,
                seal("ghp_token")
            ),
        );
        let records = run(EntityKind::GitCredentials, Table::GitCredential, &row).unwrap();
        assert_eq!(
            records,
            vec![(
                naming::git_credential_secret("GitCredentials-1"),
                "ghp_token".to_string()
            )]
        );
    }

    #[test]
    fn test_pascal_case_details() {
        let row = SourceRow::new(
            "GitCredentials-2",
            format!(r#"{{"Details":{{"Password":"{}"}}}}"#, seal("pw")),
        );
        let records = run(EntityKind::GitCredentials, Table::GitCredential, &row).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_details_is_an_error() {
        let row = SourceRow::new("GitCredentials-3", r#"{"Name":"x"}"#);
        let err = run(EntityKind::GitCredentials, Table::GitCredential, &row).unwrap_err();
        assert!(matches!(
            err,
            Error::Extract(ExtractError::UnexpectedShape { field: "Details", .. })
        ));
    }
}
