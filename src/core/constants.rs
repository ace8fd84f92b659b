//! Constants used throughout octosecrets.
//!
//! Centralizes default names and limits. Anything a deployment might need to
//! change is read through [`crate::core::config::Config`] instead of these
//! values directly.

/// Default configuration file name.
pub const CONFIG_FILE: &str = "octosecrets.toml";

/// Library variable set holding the published payload.
pub const SECRETS_CONTAINER: &str = "SpaceSensitiveVars";

/// Variable holding the published payload. Also skipped during extraction
/// so a previous run's output is never read back as a source secret.
pub const SECRETS_VARIABLE: &str = "OctoterraWiz.Terraform.Vars";

/// Default SQL Server port.
pub const DEFAULT_DB_PORT: u16 = 1433;

/// Default source database name.
pub const DEFAULT_DB_NAME: &str = "Octopus";

/// Default destination space.
pub const DEFAULT_SPACE: &str = "Spaces-1";

/// Seconds allowed to connect and validate the source database.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Seconds allowed per source table query.
pub const QUERY_TIMEOUT_SECS: u64 = 60;

/// Seconds allowed per destination API request.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Variable-set owner types whose variables are extracted.
pub const EXTRACTED_OWNER_TYPES: &[&str] = &["Project", "LibraryVariableSet"];

/// Header carrying the destination API key.
pub const API_KEY_HEADER: &str = "X-Octopus-ApiKey";
