//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

/// Environment variables that would leak the caller's credentials into a
/// test run.
const CREDENTIAL_VARS: &[&str] = &[
    "OCTOSECRETS_DB_PASSWORD",
    "OCTOSECRETS_MASTER_KEY",
    "OCTOSECRETS_API_KEY",
    "OCTOSECRETS_CONFIG",
    "OCTOSECRETS_LOG",
];

impl Test {
    /// Create an octosecrets command running in the test directory.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("octosecrets").expect("failed to find octosecrets binary");
        for var in CREDENTIAL_VARS {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run octosecrets with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run octosecrets")
    }

    /// Run octosecrets with `args` and extra environment variables.
    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = self.cmd();
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.args(args).output().expect("failed to run octosecrets")
    }
}
