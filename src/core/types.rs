//! Type aliases for domain concepts.

/// A variable-definitions identifier (e.g. `feed_nuget_password`).
///
/// Always matches `[A-Za-z_][A-Za-z0-9_]*`.
pub type Identifier = String;

/// Identity of a source row: an id, owner id or display name.
pub type RecordId = String;

/// Id of a variable set on the destination server.
pub type VariableSetId = String;
