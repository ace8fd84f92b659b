//! Octosecrets - extract, decrypt and republish the secrets of a deployment
//! automation workspace.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── check         # Validate database connectivity
//! │   ├── extract       # Write the variable-definitions file
//! │   ├── publish       # Extract and publish to the destination
//! │   ├── spread        # Spread scoped sensitive variables
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # octosecrets.toml management
//!     ├── cipher/       # AES-CBC decryption of stored secrets
//!     ├── naming        # Deterministic variable names
//!     ├── source/       # Source database access
//!     │   ├── mssql     # SQL Server backend
//!     │   └── memory    # In-memory backend
//!     ├── extract/      # One extractor per entity kind
//!     ├── coordinator   # Runs every extractor in order
//!     ├── octopus/      # Destination variable API
//!     ├── publish       # Idempotent payload publishing
//!     └── spread        # Scope spreader
//! ```
//!
//! # Data flow
//!
//! database → extractors (decrypt, name) → coordinator → publisher
//!
//! The spreader runs independently against the destination's own library
//! variable sets.

pub mod cli;
pub mod core;
pub mod error;
