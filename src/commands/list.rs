use anyhow::{Context, Result};
use clap::Args;

use crate::config::ConfigStore;

#[derive(Debug, Clone, Args)]
pub struct ListCommand {
    #[arg(short, long, help = "Show each profile's credential type")]
    pub long: bool,
}

impl ListCommand {
    pub fn execute(self, store: &ConfigStore) -> Result<()> {
        let names = store
            .profile_names()
            .context("Failed to list profiles")?;

        for name in names {
            if self.long {
                let kind = store.profile(&name)?.kind();
                println!("{name}\t{}", kind.as_str());
            } else {
                println!("{name}");
            }
        }

        Ok(())
    }
}
