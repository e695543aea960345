use anyhow::{Context, Result};
use clap::Args;

use crate::{config::ConfigStore, session::ActiveSessionWriter};

#[derive(Debug, Clone, Args)]
pub struct ClearCommand {}

impl ClearCommand {
    pub fn execute(self, store: &ConfigStore) -> Result<()> {
        ActiveSessionWriter::new(store)
            .clear_active()
            .context("Failed to clear the active session")?;
        eprintln!("Active AWS session cleared.");
        Ok(())
    }
}
