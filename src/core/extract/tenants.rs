//! Tenant variables.
//!
//! Every tenant variable carries a `Value` object; only sensitive ones hold
//! a `SensitiveValue` inside it.

use super::fields;
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let value = fields::object(&doc, "Value").required(ctx, "Value")?;

    match fields::string(value, "SensitiveValue").optional() {
        Some(secret) => Ok(vec![ctx.secret(
            naming::tenant_variable_secret(&row.identity),
            secret,
        )?]),
        None => Ok(Vec::new()),
    }
}
