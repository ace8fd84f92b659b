//! Certificates. The certificate data is always present; the password is
//! optional.

use super::fields;
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let data = fields::string(&doc, "CertificateData").required(ctx, "CertificateData")?;

    let mut records = vec![ctx.secret(naming::certificate_data(&row.identity), data)?];

    if let Some(password) = fields::string(&doc, "Password").optional() {
        records.push(ctx.secret(naming::certificate_password(&row.identity), password)?);
    }

    Ok(records)
}
