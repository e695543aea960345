use anyhow::{Context, Result};
use clap::Args;

use crate::{aws::SdkBackend, config::ConfigStore, login::AwsCliLogin, monitor::ExpirationMonitor};

#[derive(Debug, Clone, Args)]
pub struct RefreshCommand {
    #[arg(help = "Profile to refresh (defaults to AWS_PROFILE)")]
    pub profile: Option<String>,
}

impl RefreshCommand {
    pub fn execute(self, store: &ConfigStore) -> Result<()> {
        let profile = super::profile_or_env(self.profile)?;

        let backend = SdkBackend;
        let login = AwsCliLogin::new();
        ExpirationMonitor::new(store, &backend, &login)
            .auto_refresh(&profile)
            .with_context(|| format!("Failed to refresh profile '{profile}'"))?;

        eprintln!("Refreshed credentials for {profile}.");
        Ok(())
    }
}
