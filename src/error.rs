//! Error types.
//!
//! One top-level [`Error`] composed of per-concern enums. Messages carry the
//! entity kind and non-sensitive identifiers only; decrypted values never
//! appear in an error.

use thiserror::Error;

use crate::core::extract::EntityKind;
use crate::core::source::Table;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Spread(#[from] SpreadError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which half of an encrypted payload (or the key) failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPart {
    Ciphertext,
    Iv,
    MasterKey,
}

impl std::fmt::Display for SecretPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ciphertext => write!(f, "ciphertext"),
            Self::Iv => write!(f, "iv"),
            Self::MasterKey => write!(f, "master key"),
        }
    }
}

/// Decryption errors.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("malformed secret: {0}")]
    MalformedSecret(String),

    #[error("invalid base64 in {part}: {source}")]
    Encoding {
        part: SecretPart,
        #[source]
        source: base64::DecodeError,
    },

    #[error("IV length must equal the cipher block size (16 bytes), got {0}")]
    InvalidIv(usize),

    #[error("master key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid PKCS#7 padding")]
    InvalidPadding,

    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Entity extraction errors. Each variant names the entity kind.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{kind}: record {record} is missing required field {field}")]
    UnexpectedShape {
        kind: EntityKind,
        record: String,
        field: &'static str,
    },

    #[error("{kind}: record {record} holds invalid JSON: {source}")]
    InvalidJson {
        kind: EntityKind,
        record: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind}: failed to decrypt record {record}: {source}")]
    Decrypt {
        kind: EntityKind,
        record: String,
        #[source]
        source: CipherError,
    },

    #[error("{kind}: {source}")]
    Source {
        kind: EntityKind,
        #[source]
        source: SourceError,
    },
}

/// Source database errors.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to connect to database: {0}")]
    Connect(String),

    #[error("query against {table} timed out after {secs}s")]
    Timeout { table: Table, secs: u64 },

    #[error("connection check timed out after {0}s")]
    PingTimeout(u64),

    #[error("query against {table} failed: {reason}")]
    Query { table: Table, reason: String },

    #[error("unexpected value in column {column} of {table}")]
    Column { table: Table, column: &'static str },
}

/// Destination server errors.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("request to {path} failed: {reason}")]
    Request { path: String, reason: String },

    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("variable set {0} not found")]
    SetNotFound(String),

    #[error("variable {name} in set {set} has no id")]
    MissingId { set: String, name: String },

    #[error("variable {id} not found in set {set}")]
    VariableNotFound { set: String, id: String },
}

/// Scope spreading errors.
#[derive(Error, Debug)]
pub enum SpreadError {
    /// A sensitive variable came back with a populated value. Spreading it
    /// could overwrite or expose a secret this process does not own.
    #[error("invariant violated: sensitive variable {name} ({id}) has a value in memory")]
    InvariantViolation { name: String, id: String },

    #[error("failed to record original scope: {0}")]
    ScopeSnapshot(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
