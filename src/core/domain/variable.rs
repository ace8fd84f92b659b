//! Destination server variable model.
//!
//! Mirrors the JSON the destination's variable-management API reads and
//! writes. Fields this crate does not interpret are kept in `extra` so a
//! read-modify-write never drops them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type tag of a sensitive variable.
pub const SENSITIVE_TYPE: &str = "Sensitive";

/// Type tag of a plain text variable.
pub const STRING_TYPE: &str = "String";

/// Dimensions narrowing where a variable value applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariableScope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tenant_tag: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub process_owner: Vec<String>,
}

impl VariableScope {
    /// Dimensions in the fixed order used to build spread names.
    pub fn dimensions(&self) -> [&[String]; 7] {
        [
            self.environment.as_slice(),
            self.machine.as_slice(),
            self.role.as_slice(),
            self.action.as_slice(),
            self.tenant_tag.as_slice(),
            self.channel.as_slice(),
            self.process_owner.as_slice(),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().iter().all(|d| d.is_empty())
    }

    /// First value of each non-empty dimension, in fixed order.
    pub fn first_values(&self) -> impl Iterator<Item = &str> {
        self.dimensions()
            .into_iter()
            .filter_map(|d| d.first().map(String::as_str))
    }
}

/// A single variable.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Variable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Always `None` for sensitive variables read from the server.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_type", rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default)]
    pub scope: VariableScope,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_type() -> String {
    STRING_TYPE.to_string()
}

impl Variable {
    /// A plain text variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: STRING_TYPE.to_string(),
            ..Self::default()
        }
    }

    /// A sensitive variable holding `value`.
    pub fn sensitive(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            kind: SENSITIVE_TYPE.to_string(),
            is_sensitive: true,
            ..Self::default()
        }
    }

    /// Marked sensitive and typed as such.
    pub fn is_secret(&self) -> bool {
        self.is_sensitive && self.kind == SENSITIVE_TYPE
    }

    /// Append a block to the description.
    pub fn annotate(&mut self, heading: &str, body: &str) {
        let description = self.description.get_or_insert_with(String::new);
        description.push_str("\n\n");
        description.push_str(heading);
        description.push_str("\n\n");
        description.push_str(body);
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match (&self.value, self.is_sensitive) {
            (Some(_), true) => Some("[redacted]"),
            (Some(v), false) => Some(v.as_str()),
            (None, _) => None,
        };
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &value)
            .field("kind", &self.kind)
            .field("is_sensitive", &self.is_sensitive)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// All variables owned by one project or library variable set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariableSet {
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A library variable set: a named, shareable container of variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LibraryVariableSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_set_id: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_content_type() -> String {
    "Variables".to_string()
}

impl LibraryVariableSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: default_content_type(),
            ..Self::default()
        }
    }
}
