use anyhow::{Context, Result};

use crate::constants;

pub mod clear;
pub mod completions;
pub mod current;
pub mod export;
pub mod list;
pub mod refresh;
pub mod status;
pub mod switch;

pub use clear::ClearCommand;
pub use completions::CompletionsCommand;
pub use current::CurrentCommand;
pub use export::ExportCommand;
pub use list::ListCommand;
pub use refresh::RefreshCommand;
pub use status::StatusCommand;
pub use switch::UseCommand;

/// Explicit profile argument, falling back to `AWS_PROFILE`.
fn profile_or_env(profile: Option<String>) -> Result<String> {
    profile
        .or_else(constants::env_profile)
        .context("No profile given and AWS_PROFILE is not set")
}
