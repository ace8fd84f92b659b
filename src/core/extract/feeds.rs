//! Package feed credentials.

use super::fields;
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let name = fields::string(&doc, "Name")
        .optional()
        .unwrap_or(row.identity.as_str());

    let mut records = Vec::new();
    if let Some(password) = fields::string(&doc, "Password").optional() {
        records.push(ctx.secret(naming::feed_password(name), password)?);
    }
    if let Some(secret_key) = fields::string(&doc, "SecretKey").optional() {
        records.push(ctx.secret(naming::feed_secret_key(name), secret_key)?);
    }
    Ok(records)
}
