//! Test support utilities for octosecrets integration tests.
//!
//! Provides fixtures, assertions and an isolated environment for running
//! the binary.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use tempfile::TempDir;

/// Test environment with an isolated working directory.
///
/// Child processes use `.current_dir()` so tests can run in parallel, and
/// credential environment variables inherited from the developer's shell are
/// removed.
pub struct Test {
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a test environment with `octosecrets.toml` written.
    pub fn with_config(contents: &str) -> Self {
        let t = Self::new();
        std::fs::write(t.dir.path().join("octosecrets.toml"), contents)
            .expect("failed to write config");
        t
    }
}
