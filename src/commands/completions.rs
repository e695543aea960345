use clap::{Args, CommandFactory};
use clap_complete::Shell;
use std::io;

use crate::cli::Cli;

#[derive(Debug, Clone, Args)]
pub struct CompletionsCommand {
    #[arg(value_enum, help = "Target shell for completion script")]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn execute(self) {
        let mut cmd = Cli::command();
        let app_name = cmd.get_name().to_string();
        clap_complete::generate(self.shell, &mut cmd, app_name, &mut io::stdout());
    }

    #[cfg(test)]
    pub fn generate_to_string(&self) -> String {
        let mut cmd = Cli::command();
        let app_name = cmd.get_name().to_string();
        let mut buffer = Vec::new();
        clap_complete::generate(self.shell, &mut cmd, app_name, &mut buffer);
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_shell_completion(shell: Shell, expected_patterns: &[&str]) {
        let cmd = CompletionsCommand { shell };
        let result = cmd.generate_to_string();

        assert!(!result.is_empty(), "Completion script should not be empty");

        for pattern in expected_patterns {
            assert!(
                result.contains(pattern),
                "Expected pattern '{}' not found in {} completion script",
                pattern,
                shell
            );
        }
    }

    #[test]
    fn test_bash_completion() {
        validate_shell_completion(
            Shell::Bash,
            &["_awsctx()", "COMPREPLY", "complete -F _awsctx"],
        );
    }

    #[test]
    fn test_zsh_completion() {
        validate_shell_completion(Shell::Zsh, &["#compdef awsctx", "_awsctx"]);
    }

    #[test]
    fn test_fish_completion() {
        validate_shell_completion(Shell::Fish, &["complete -c awsctx"]);
    }

    #[test]
    fn test_completion_contains_subcommands() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let result = CompletionsCommand { shell }.generate_to_string();

            for subcommand in ["use", "export", "current", "status", "refresh", "clear", "list"] {
                assert!(
                    result.contains(subcommand),
                    "{} command should be in {} completions",
                    subcommand,
                    shell
                );
            }
        }
    }
}
