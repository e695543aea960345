use std::{
    io,
    process::{Command, Stdio},
};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::constants::AWS_CLI_PROGRAM;

/// Interactive SSO login for a named `[sso-session]`.
pub trait LoginService {
    fn login(&self, sso_session: &str) -> Result<()>;
}

/// Runs `aws sso login --sso-session <name>`.
///
/// stdin and stderr are inherited; the child's stdout goes to our stderr so
/// it never ends up in output a shell is about to `eval`.
#[derive(Debug, Clone)]
pub struct AwsCliLogin {
    program: String,
}

impl AwsCliLogin {
    pub fn new() -> Self {
        Self::with_program(AWS_CLI_PROGRAM)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, sso_session: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(["sso", "login", "--sso-session", sso_session]);
        command
    }
}

impl Default for AwsCliLogin {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginService for AwsCliLogin {
    fn login(&self, sso_session: &str) -> Result<()> {
        info!("Starting SSO login for session: {}", sso_session);

        let status = self
            .command(sso_session)
            .stdin(Stdio::inherit())
            .stdout(io::stderr())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to run `{} sso login`", self.program))?;

        if !status.success() {
            bail!("`{} sso login` exited with {}", self.program, status);
        }

        info!("SSO login completed for session: {}", sso_session);
        Ok(())
    }
}

/// Refuses every login, for call sites that opted out of interactive flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLogin;

impl LoginService for DisabledLogin {
    fn login(&self, sso_session: &str) -> Result<()> {
        bail!("SSO login for session '{sso_session}' is disabled (--no-login)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_command_arguments() {
        let login = AwsCliLogin::new();
        let command = login.command("companysso");
        let args: Vec<_> = command
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(command.get_program(), "aws");
        assert_eq!(args, vec!["sso", "login", "--sso-session", "companysso"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_login_failure_is_reported() {
        let login = AwsCliLogin::with_program("false");
        let err = login.login("companysso").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn test_disabled_login_refuses() {
        let err = DisabledLogin.login("companysso").unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_missing_program_is_reported() {
        let login = AwsCliLogin::with_program("definitely-not-an-installed-aws-cli");
        let err = login.login("companysso").unwrap_err();
        assert!(err.to_string().contains("Failed to run"));
    }
}
