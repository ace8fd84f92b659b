//! Account credentials.
//!
//! Each account type stores a different secret. The first present of the
//! primary fields is extracted under the account's name; an SSH key pair's
//! private key file is extracted separately under the `_cert` role.

use super::fields;
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

/// Primary secret fields in precedence order.
const PRIMARY_FIELDS: &[&str] = &[
    "Password",
    "SecretKey",
    "JsonKey",
    "Token",
    "PrivateKeyPassphrase",
];

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let name = fields::string(&doc, "Name")
        .optional()
        .unwrap_or(row.identity.as_str());

    let mut records = Vec::new();

    if let Some(secret) = PRIMARY_FIELDS
        .iter()
        .find_map(|field| fields::string(&doc, field).optional())
    {
        records.push(ctx.secret(naming::account_secret(name), secret)?);
    }

    if let Some(key_file) = fields::string(&doc, "PrivateKeyFile").optional() {
        records.push(ctx.secret(naming::account_cert(name), key_file)?);
    }

    Ok(records)
}
