//! Deployment targets and their proxies.
//!
//! Reads two tables: a target's endpoint may carry the password used to
//! encrypt sensitive variables sent to it, and a proxy may carry a password.

use super::fields;
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::{SourceRow, Table};
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    match ctx.table {
        Table::Proxy => proxy(ctx, row),
        _ => target(ctx, row),
    }
}

fn target(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let endpoint = fields::object(&doc, "Endpoint").required(ctx, "Endpoint")?;

    match fields::string(endpoint, "SensitiveVariablesEncryptionPassword").optional() {
        Some(password) => Ok(vec![
            ctx.secret(naming::machine_secret(&row.identity), password)?
        ]),
        None => Ok(Vec::new()),
    }
}

fn proxy(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let name = fields::string(&doc, "Name")
        .optional()
        .unwrap_or(row.identity.as_str());

    match fields::string(&doc, "Password").optional() {
        Some(password) => Ok(vec![
            ctx.secret(naming::machine_proxy_password(name), password)?
        ]),
        None => Ok(Vec::new()),
    }
}
