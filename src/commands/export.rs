use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;

use crate::{
    aws::SdkBackend,
    chain::RoleChain,
    config::ConfigStore,
    constants,
    login::AwsCliLogin,
    mfa::TerminalMfaPrompt,
    resolver::{CredentialResolver, Resolution},
    session::ActiveSessionWriter,
};

#[derive(Debug, Clone, Args)]
pub struct ExportCommand {
    #[arg(help = "Profile to export (defaults to AWS_PROFILE)")]
    pub profile: Option<String>,
}

impl ExportCommand {
    /// Print shell `export` statements. Nothing reaches stdout unless the
    /// whole resolution succeeded.
    pub async fn execute(self, store: &ConfigStore) -> Result<()> {
        let profile = super::profile_or_env(self.profile)?;

        let backend = SdkBackend;
        let mfa = TerminalMfaPrompt;
        let login = AwsCliLogin::new();
        let resolver = CredentialResolver::new(store, &backend, &mfa, &login);

        let chain = RoleChain::walk(store, &profile)?;
        let resolution = resolver.resolve_chain(&chain).await?;
        let region = chain
            .region()
            .map(String::from)
            .or_else(constants::env_region);

        let script = match resolution {
            Resolution::Static => {
                let keys = ActiveSessionWriter::new(store).static_keys(&profile)?;
                render_exports(&Exports {
                    access_key_id: &keys.access_key_id,
                    secret_access_key: &keys.secret_access_key,
                    session_token: None,
                    expires_at: None,
                    region: region.as_deref(),
                })
            }
            Resolution::Temporary(credential) => render_exports(&Exports {
                access_key_id: &credential.access_key_id,
                secret_access_key: &credential.secret_access_key,
                session_token: credential.session_token(),
                expires_at: credential.expires_at,
                region: region.as_deref(),
            }),
        };

        let mut stdout = io::stdout().lock();
        stdout.write_all(script.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

struct Exports<'a> {
    access_key_id: &'a str,
    secret_access_key: &'a str,
    session_token: Option<&'a str>,
    expires_at: Option<DateTime<Utc>>,
    region: Option<&'a str>,
}

fn render_exports(exports: &Exports<'_>) -> String {
    let mut lines = vec![
        "unset AWS_PROFILE".to_string(),
        export("AWS_ACCESS_KEY_ID", exports.access_key_id),
        export("AWS_SECRET_ACCESS_KEY", exports.secret_access_key),
    ];

    match exports.session_token {
        Some(token) => lines.push(export("AWS_SESSION_TOKEN", token)),
        None => lines.push("unset AWS_SESSION_TOKEN".to_string()),
    }

    match exports.expires_at {
        Some(expires_at) => lines.push(export(
            "AWS_CREDENTIAL_EXPIRATION",
            &expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )),
        None => lines.push("unset AWS_CREDENTIAL_EXPIRATION".to_string()),
    }

    if let Some(region) = exports.region {
        lines.push(export("AWS_REGION", region));
        lines.push(export("AWS_DEFAULT_REGION", region));
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

fn export(name: &str, value: &str) -> String {
    format!("export {name}={}", shell_quote(value))
}

/// Single-quote a value for POSIX shells.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("abc"), "'abc'");
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
        assert_eq!(shell_quote("$(rm -rf ~)"), "'$(rm -rf ~)'");
    }

    #[test]
    fn test_render_temporary_exports() {
        let expires_at = DateTime::from_timestamp(1_700_000_000, 0);
        let script = render_exports(&Exports {
            access_key_id: "ASIATEMP",
            secret_access_key: "secret/with+chars",
            session_token: Some("token"),
            expires_at,
            region: Some("eu-west-1"),
        });

        assert_eq!(
            script,
            "unset AWS_PROFILE\n\
             export AWS_ACCESS_KEY_ID='ASIATEMP'\n\
             export AWS_SECRET_ACCESS_KEY='secret/with+chars'\n\
             export AWS_SESSION_TOKEN='token'\n\
             export AWS_CREDENTIAL_EXPIRATION='2023-11-14T22:13:20Z'\n\
             export AWS_REGION='eu-west-1'\n\
             export AWS_DEFAULT_REGION='eu-west-1'\n"
        );
    }

    #[test]
    fn test_render_static_exports_clears_token() {
        let script = render_exports(&Exports {
            access_key_id: "AKIA",
            secret_access_key: "secret",
            session_token: None,
            expires_at: None,
            region: None,
        });

        assert!(script.contains("unset AWS_SESSION_TOKEN\n"));
        assert!(script.contains("unset AWS_CREDENTIAL_EXPIRATION\n"));
        assert!(!script.contains("AWS_REGION"));
    }
}
