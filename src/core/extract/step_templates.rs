//! Reusable step template parameters with sensitive default values.

use super::fields;
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;

    // Templates are addressed by their immutable id, which survives renames
    // and version bumps.
    let Some(template_id) = fields::string(&doc, "ImmutableId").optional() else {
        return Ok(Vec::new());
    };
    let Some(parameters) = fields::array(&doc, "Parameters").optional() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for parameter in parameters.iter().filter_map(|p| p.as_object()) {
        let Some(parameter_id) = fields::string(parameter, "Id").optional() else {
            continue;
        };
        if let Some(secret) = fields::sensitive_value(parameter, "DefaultValue") {
            records.push(ctx.secret(
                naming::step_template_parameter(template_id, parameter_id),
                secret,
            )?);
        }
    }
    Ok(records)
}
