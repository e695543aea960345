use clap::Args;

use crate::{config::ConfigStore, session::ActiveSessionWriter};

#[derive(Debug, Clone, Args)]
pub struct CurrentCommand {}

impl CurrentCommand {
    /// Print the profile behind the active session; prints nothing if unset.
    pub fn execute(self, store: &ConfigStore) {
        let name = ActiveSessionWriter::new(store).active_profile_name();
        if !name.is_empty() {
            println!("{name}");
        }
    }
}
