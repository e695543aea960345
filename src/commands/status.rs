use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::{
    aws::SdkBackend,
    config::ConfigStore,
    constants,
    login::AwsCliLogin,
    monitor::{CredentialStatus, ExpirationMonitor},
    session::ActiveSessionWriter,
};

#[derive(Debug, Clone, Args)]
pub struct StatusCommand {
    #[arg(help = "Profile to check (defaults to the active profile, then AWS_PROFILE)")]
    pub profile: Option<String>,

    #[arg(long, help = "Print the status as JSON")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    profile: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    status: CredentialStatus,
    active: bool,
}

impl StatusCommand {
    pub async fn execute(self, store: &ConfigStore) -> Result<()> {
        let active = ActiveSessionWriter::new(store).active_profile_name();
        let profile = self
            .profile
            .or_else(|| Some(active.clone()).filter(|a| !a.is_empty()))
            .or_else(constants::env_profile)
            .context("No profile given, no active session and AWS_PROFILE is not set")?;

        let kind = store.profile(&profile)?.kind();

        let backend = SdkBackend;
        let login = AwsCliLogin::new();
        let status = ExpirationMonitor::new(store, &backend, &login)
            .check_status(&profile)
            .await?;

        let report = StatusReport {
            profile: &profile,
            kind: kind.as_str(),
            status,
            active: profile == active,
        };

        if self.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", render_status(&report));
        }

        Ok(())
    }
}

fn render_status(report: &StatusReport<'_>) -> String {
    let marker = if report.active { " (active)" } else { "" };
    format!(
        "{}{marker}: {} [{}]",
        report.profile,
        report.status.as_str(),
        report.kind
    )
}
