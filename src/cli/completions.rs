//! Completions command.
//!
//! Prints a completion script for `octosecrets` covering every subcommand
//! and its source/destination flags.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::Shell as CompletionShell;

use crate::cli::{Cli, Shell};
use crate::error::Result;

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => Self::Bash,
            Shell::Zsh => Self::Zsh,
            Shell::Fish => Self::Fish,
            Shell::PowerShell => Self::PowerShell,
        }
    }
}

/// Write the completion script for `shell` to stdout.
pub fn execute(shell: Shell) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_script(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(CompletionShell::from(shell), &mut cmd, bin, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_names_commands_and_flags() {
        let mut script = Vec::new();
        write_script(Shell::Bash, &mut script).unwrap();
        let script = String::from_utf8(script).unwrap();

        assert!(script.contains("octosecrets"));
        for word in ["extract", "publish", "spread", "--db-server", "--dry-run"] {
            assert!(script.contains(word), "missing {}", word);
        }
    }
}
