//! Domain types.

mod record;
mod variable;

pub use record::{escape, SecretRecord, VariableFile};
pub use variable::{
    LibraryVariableSet, Variable, VariableScope, VariableSet, SENSITIVE_TYPE, STRING_TYPE,
};
