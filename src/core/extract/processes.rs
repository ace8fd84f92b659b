//! Deployment process step properties.
//!
//! Walks `Steps[].Actions[].Properties` and extracts every property whose
//! value is a sensitive-value wrapper. The process row's identity is its
//! owner (project) id.

use super::fields::{self, Object};
use super::RowContext;
use crate::core::domain::SecretRecord;
use crate::core::naming;
use crate::core::source::SourceRow;
use crate::error::Result;

pub(super) fn extract(ctx: &RowContext<'_>, row: &SourceRow) -> Result<Vec<SecretRecord>> {
    let doc = ctx.parse(row)?;
    let Some(steps) = fields::array(&doc, "Steps").optional() else {
        return Ok(Vec::new());
    };

    let actions = steps
        .iter()
        .filter_map(|step| step.as_object())
        .filter_map(|step| fields::array(step, "Actions").optional())
        .flatten()
        .filter_map(|action| action.as_object());

    let mut records = Vec::new();
    for action in actions {
        records.extend(action_secrets(ctx, &row.identity, action)?);
    }
    Ok(records)
}

fn action_secrets(
    ctx: &RowContext<'_>,
    owner_id: &str,
    action: &Object,
) -> Result<Vec<SecretRecord>> {
    let Some(action_id) = fields::string(action, "Id").optional() else {
        return Ok(Vec::new());
    };
    let Some(properties) = fields::object(action, "Properties").optional() else {
        return Ok(Vec::new());
    };

    properties
        .keys()
        .filter_map(|property| {
            fields::sensitive_value(properties, property).map(|secret| (property, secret))
        })
        .map(|(property, secret)| {
            ctx.secret(naming::step_property(owner_id, action_id, property), secret)
        })
        .collect()
}
