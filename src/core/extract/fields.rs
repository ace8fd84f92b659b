//! Typed lookups into semi-schemaless JSON payloads.
//!
//! Each lookup says whether a field was found, missing (absent or `null`),
//! or present with the wrong type. Call sites pick `optional()` when a
//! record may legitimately lack the field, or `required()` when its absence
//! means the source data is corrupt or incompatible.

use serde_json::{Map, Value};

use super::RowContext;
use crate::error::Result;

pub(crate) type Object = Map<String, Value>;

/// Outcome of looking up one field.
#[derive(Debug, PartialEq)]
pub(crate) enum Lookup<'a, T> {
    Found(T),
    Missing,
    WrongType(&'a Value),
}

impl<'a, T> Lookup<'a, T> {
    /// The value, or `None` if missing or wrongly typed.
    pub(crate) fn optional(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::Missing | Self::WrongType(_) => None,
        }
    }

    /// The value, or an `UnexpectedShape` error naming `field`.
    pub(crate) fn required(self, ctx: &RowContext<'_>, field: &'static str) -> Result<T> {
        match self {
            Self::Found(v) => Ok(v),
            Self::Missing | Self::WrongType(_) => Err(ctx.unexpected_shape(field)),
        }
    }
}

fn lookup<'a, T>(
    obj: &'a Object,
    key: &str,
    cast: impl FnOnce(&'a Value) -> Option<T>,
) -> Lookup<'a, T> {
    match obj.get(key) {
        None | Some(Value::Null) => Lookup::Missing,
        Some(value) => match cast(value) {
            Some(v) => Lookup::Found(v),
            None => Lookup::WrongType(value),
        },
    }
}

pub(crate) fn string<'a>(obj: &'a Object, key: &str) -> Lookup<'a, &'a str> {
    lookup(obj, key, Value::as_str)
}

pub(crate) fn object<'a>(obj: &'a Object, key: &str) -> Lookup<'a, &'a Object> {
    lookup(obj, key, Value::as_object)
}

pub(crate) fn array<'a>(obj: &'a Object, key: &str) -> Lookup<'a, &'a [Value]> {
    lookup(obj, key, |v| v.as_array().map(Vec::as_slice))
}

/// `obj[key].SensitiveValue` where `obj[key]` is a nested object.
///
/// Sensitive values in property bags and parameter defaults are wrapped as
/// `{"HasValue": true, "SensitiveValue": "..."}`; plain values are bare
/// strings and yield `None`.
pub(crate) fn sensitive_value<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    object(obj, key)
        .optional()
        .and_then(|inner| string(inner, "SensitiveValue").optional())
}
