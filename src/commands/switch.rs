use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::{
    aws::SdkBackend,
    chain::RoleChain,
    config::ConfigStore,
    login::{AwsCliLogin, DisabledLogin, LoginService},
    mfa::TerminalMfaPrompt,
    resolver::{CredentialResolver, Resolution},
    session::ActiveSessionWriter,
};

#[derive(Debug, Clone, Args)]
pub struct UseCommand {
    #[arg(help = "Profile to activate (defaults to AWS_PROFILE)")]
    pub profile: Option<String>,

    #[arg(
        long,
        help = "Fail with exit code 10 instead of starting an SSO login when the session has expired"
    )]
    pub no_login: bool,
}

impl UseCommand {
    pub async fn execute(self, store: &ConfigStore) -> Result<()> {
        let profile = super::profile_or_env(self.profile)?;
        info!("Activating profile: {}", profile);

        // Upstream refresh inside the resolver also goes through this service
        if self.no_login {
            activate(store, &profile, &DisabledLogin, false).await
        } else {
            activate(store, &profile, &AwsCliLogin::new(), true).await
        }
    }
}

async fn activate<L: LoginService>(
    store: &ConfigStore,
    profile: &str,
    login: &L,
    retry_after_login: bool,
) -> Result<()> {
    let backend = SdkBackend;
    let mfa = TerminalMfaPrompt;
    let resolver = CredentialResolver::new(store, &backend, &mfa, login);

    let chain = RoleChain::walk(store, profile)?;
    let resolution = match resolver.resolve_chain(&chain).await {
        Err(e) if e.is_sso_expired() && retry_after_login => {
            eprintln!("{e}");
            eprintln!("Starting SSO login...");
            resolver.monitor().auto_refresh(profile)?;
            resolver.resolve_chain(&chain).await?
        }
        other => other?,
    };

    let writer = ActiveSessionWriter::new(store);
    match resolution {
        Resolution::Static => {
            writer.write_active_static(profile)?;
            eprintln!("Active AWS session: {profile} (static keys)");
        }
        Resolution::Temporary(credential) => {
            writer.write_active(&credential, chain.region(), profile)?;
            eprintln!("Active AWS session: {profile}");
            if let Some(expires_at) = credential.expires_at {
                eprintln!("Credentials will expire at: {}", expires_at.to_rfc3339());
            }
        }
    }

    Ok(())
}
