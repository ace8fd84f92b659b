//! Extracted secrets and the variable-definitions file they serialize into.

use zeroize::Zeroizing;

use crate::core::types::Identifier;

/// One decrypted secret, named and ready to serialize.
///
/// Lives only for the current run. The value is wiped on drop.
#[derive(Clone)]
pub struct SecretRecord {
    name: Identifier,
    value: Zeroizing<String>,
}

impl SecretRecord {
    pub fn new(name: Identifier, value: Zeroizing<String>) -> Self {
        Self { name, value }
    }

    /// Identifier the value is written under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decrypted value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Accumulates `name = "value"` lines.
///
/// Records with an empty value are dropped: an empty secret is not
/// meaningful and must not occupy a slot.
#[derive(Default)]
pub struct VariableFile {
    text: Zeroizing<String>,
    lines: usize,
}

impl VariableFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns whether a line was written.
    pub fn push(&mut self, record: &SecretRecord) -> bool {
        if record.is_empty() {
            return false;
        }
        self.text.push_str(record.name());
        self.text.push_str(" = ");
        self.text.push_str(&escape(record.value()));
        self.text.push('\n');
        self.lines += 1;
        true
    }

    /// Append another file's lines.
    pub fn append(&mut self, other: VariableFile) {
        self.text.push_str(&other.text);
        self.lines += other.lines;
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> Zeroizing<String> {
        self.text
    }
}

impl std::fmt::Debug for VariableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableFile")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

/// Quote a value as an HCL string literal.
///
/// JSON string escaping covers quotes, backslashes and control characters.
/// HCL additionally treats `${` and `%{` as template introducers, which are
/// doubled so the value is taken literally.
pub fn escape(value: &str) -> String {
    serde_json::Value::String(value.to_owned())
        .to_string()
        .replace("${", "$${")
        .replace("%{", "%%{")
}
